//! Host document tree.
//!
//! An arena of nodes addressed by [`NodeKey`]. The arena owns every node;
//! parent and child links are keys into the same arena. Detached nodes stay
//! allocated until the next [`Document::reset`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

/// Document shared between the host and the reconciler
pub type SharedDocument = Rc<RefCell<Document>>;

/// Handle to a node in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(usize);

impl NodeKey {
    /// Arena slot
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0
    }
}

/// Element namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Namespace {
    /// Regular HTML element; tags compare case-insensitively
    Html,
    /// SVG element
    Svg,
}

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    /// Key outside the arena
    #[error("Node {0:?} does not exist")]
    NodeNotFound(NodeKey),
    /// Insertion would break the tree shape
    #[error("Hierarchy request error: {0}")]
    HierarchyRequest(&'static str),
    /// Attribute name rejected
    #[error("Invalid character in name {0:?}")]
    InvalidCharacter(String),
    /// Child or rule index past the end
    #[error("Index {index} is out of range for length {len}")]
    IndexSize {
        /// Requested index
        index: usize,
        /// Length at the time
        len: usize,
    },
    /// Rule text did not parse
    #[error("Syntax error in rule {0:?}")]
    Syntax(String),
    /// Operation the node kind cannot perform
    #[error("Operation not supported: {0}")]
    NotSupported(&'static str),
    /// Element operation on a non-element
    #[error("Node {0:?} is not an element")]
    NotElement(NodeKey),
    /// Data written to a node that holds none
    #[error("Node {0:?} has no character data")]
    NotCharacterData(NodeKey),
    /// Detach of a node that is already detached
    #[error("Node {0:?} has no parent")]
    NoParent(NodeKey),
}

/// Parsed rule list of a STYLE element
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StyleSheet {
    rules: Vec<String>,
}

impl StyleSheet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse stylesheet text into top-level rules
    ///
    /// Rules are split on balanced braces; a trailing fragment that never
    /// closes is dropped.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut rules = Vec::new();
        let mut depth = 0usize;
        let mut start = 0usize;
        for (i, c) in text.char_indices() {
            match c {
                '{' => depth += 1,
                '}' if depth > 0 => {
                    depth -= 1;
                    if depth == 0 {
                        let rule = text[start..=i].trim();
                        if !rule.is_empty() {
                            rules.push(rule.to_string());
                        }
                        start = i + 1;
                    }
                }
                ';' if depth == 0 => {
                    let rule = text[start..=i].trim();
                    if rule.starts_with('@') {
                        rules.push(rule.to_string());
                    }
                    start = i + 1;
                }
                _ => {}
            }
        }
        Self { rules }
    }

    /// Insert a rule at `index`
    ///
    /// # Errors
    ///
    /// Returns `IndexSize` if `index` is past the end and `Syntax` if the
    /// rule is not a plausible rule
    pub fn insert_rule(&mut self, rule: &str, index: usize) -> Result<usize, DomError> {
        if index > self.rules.len() {
            return Err(DomError::IndexSize {
                index,
                len: self.rules.len(),
            });
        }
        let rule = rule.trim();
        if !is_plausible_rule(rule) {
            return Err(DomError::Syntax(rule.to_string()));
        }
        self.rules.insert(index, rule.to_string());
        Ok(index)
    }

    /// Delete the rule at `index`
    ///
    /// # Errors
    ///
    /// Returns `IndexSize` if there is no rule at `index`
    pub fn delete_rule(&mut self, index: usize) -> Result<(), DomError> {
        if index >= self.rules.len() {
            return Err(DomError::IndexSize {
                index,
                len: self.rules.len(),
            });
        }
        self.rules.remove(index);
        Ok(())
    }

    #[must_use]
    pub fn rules(&self) -> &[String] {
        &self.rules
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn is_plausible_rule(rule: &str) -> bool {
    if rule.starts_with('@') && rule.ends_with(';') {
        return rule.len() > 2;
    }
    match (rule.find('{'), rule.rfind('}')) {
        (Some(open), Some(close)) => open > 0 && open < close && close == rule.len() - 1,
        _ => false,
    }
}

/// Scroll offsets of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScrollOffset {
    /// Horizontal offset
    pub left: i64,
    /// Vertical offset
    pub top: i64,
}

/// Element payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub tag: String,
    pub namespace: Namespace,
    pub attributes: IndexMap<String, String>,
    pub value: String,
    /// Value held back while the element has remote-control focus
    pub pending_value: Option<String>,
    pub checked: bool,
    pub scroll: ScrollOffset,
    pub scroll_locked: bool,
    pub sheet: Option<StyleSheet>,
    pub content_document: Option<NodeKey>,
    pub shadow_root: Option<NodeKey>,
}

impl ElementData {
    /// Case-insensitive tag comparison for HTML elements
    #[must_use]
    pub fn is_html(&self, tag: &str) -> bool {
        self.namespace == Namespace::Html && self.tag.eq_ignore_ascii_case(tag)
    }
}

/// Kind-specific node payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Top-level or frame document
    Document,
    /// Element with its payload
    Element(ElementData),
    /// Character data
    Text(String),
    /// Isolated subtree attached to a host element
    ShadowRoot { host: NodeKey },
}

/// Arena node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeKey>,
    pub children: Vec<NodeKey>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }
}

/// Tags that accept a shadow root besides custom elements
const SHADOW_HOSTS: &[&str] = &[
    "ARTICLE", "ASIDE", "BLOCKQUOTE", "BODY", "DIV", "FOOTER", "H1", "H2", "H3", "H4", "H5",
    "H6", "HEADER", "MAIN", "NAV", "P", "SECTION", "SPAN",
];

/// Host document tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeKey,
    active: Option<NodeKey>,
}

impl Document {
    /// Empty document holding a placeholder `<html>` element
    #[must_use]
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeKey(0),
            active: None,
        };
        doc.root = doc.alloc_document();
        doc
    }

    /// Empty document behind a shared handle
    #[must_use]
    pub fn new_shared() -> SharedDocument {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Drop every node and start over with an empty document
    pub fn reset(&mut self) -> NodeKey {
        *self = Self::new();
        self.root
    }

    #[must_use]
    pub const fn root(&self) -> NodeKey {
        self.root
    }

    #[must_use]
    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key.0)
    }

    fn node_mut(&mut self, key: NodeKey) -> Result<&mut Node, DomError> {
        self.nodes.get_mut(key.0).ok_or(DomError::NodeNotFound(key))
    }

    fn get(&self, key: NodeKey) -> Result<&Node, DomError> {
        self.nodes.get(key.0).ok_or(DomError::NodeNotFound(key))
    }

    #[must_use]
    pub fn element(&self, key: NodeKey) -> Option<&ElementData> {
        self.node(key).and_then(Node::as_element)
    }

    fn element_mut(&mut self, key: NodeKey) -> Result<&mut ElementData, DomError> {
        match &mut self.node_mut(key)?.kind {
            NodeKind::Element(el) => Ok(el),
            _ => Err(DomError::NotElement(key)),
        }
    }

    #[must_use]
    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.node(key).and_then(|n| n.parent)
    }

    #[must_use]
    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.node(key).map_or(&[], |n| n.children.as_slice())
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeKey {
        let key = NodeKey(self.nodes.len());
        self.nodes.push(Node::new(kind));
        key
    }

    fn alloc_document(&mut self) -> NodeKey {
        let doc = self.alloc(NodeKind::Document);
        let html = self.create_element("HTML", Namespace::Html);
        self.attach(doc, html, None);
        doc
    }

    /// Allocate a detached element
    ///
    /// STYLE elements get an empty stylesheet; IFRAME elements get a nested
    /// document.
    pub fn create_element(&mut self, tag: &str, namespace: Namespace) -> NodeKey {
        let is_html = namespace == Namespace::Html;
        let sheet = (is_html && tag.eq_ignore_ascii_case("STYLE")).then(StyleSheet::new);
        let key = self.alloc(NodeKind::Element(ElementData {
            tag: tag.to_string(),
            namespace,
            attributes: IndexMap::new(),
            value: String::new(),
            pending_value: None,
            checked: false,
            scroll: ScrollOffset::default(),
            scroll_locked: false,
            sheet,
            content_document: None,
            shadow_root: None,
        }));
        if is_html && tag.eq_ignore_ascii_case("IFRAME") {
            let inner = self.alloc_document();
            if let NodeKind::Element(el) = &mut self.nodes[key.0].kind {
                el.content_document = Some(inner);
            }
        }
        key
    }

    /// Allocate a detached text node
    pub fn create_text(&mut self, data: &str) -> NodeKey {
        self.alloc(NodeKind::Text(data.to_string()))
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeKey, mut key: NodeKey) -> bool {
        loop {
            if key == ancestor {
                return true;
            }
            match self.parent(key) {
                Some(parent) => key = parent,
                None => return false,
            }
        }
    }

    fn check_insert(&self, parent: NodeKey, child: NodeKey) -> Result<(), DomError> {
        let parent_node = self.get(parent)?;
        let child_node = self.get(child)?;
        if matches!(parent_node.kind, NodeKind::Text(_)) {
            return Err(DomError::HierarchyRequest("text nodes cannot have children"));
        }
        if matches!(child_node.kind, NodeKind::Document | NodeKind::ShadowRoot { .. }) {
            return Err(DomError::HierarchyRequest("document roots cannot be inserted"));
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest("node would become its own ancestor"));
        }
        Ok(())
    }

    fn detach(&mut self, child: NodeKey) {
        if let Some(parent) = self.nodes[child.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != child);
        }
    }

    fn attach(&mut self, parent: NodeKey, child: NodeKey, index: Option<usize>) {
        let children = &mut self.nodes[parent.0].children;
        match index {
            Some(i) if i < children.len() => children.insert(i, child),
            _ => children.push(child),
        }
        self.nodes[child.0].parent = Some(parent);
    }

    /// Insert `child` before the current child at `index` of `parent`
    ///
    /// An index past the end appends. The child is detached from any previous
    /// parent first.
    ///
    /// # Errors
    ///
    /// Returns error if either node is missing or the insertion would break
    /// the tree
    pub fn insert_before(
        &mut self,
        parent: NodeKey,
        child: NodeKey,
        index: usize,
    ) -> Result<(), DomError> {
        self.check_insert(parent, child)?;
        let reference = self.children(parent).get(index).copied();
        self.detach(child);
        let at = reference.and_then(|r| self.children(parent).iter().position(|c| *c == r));
        self.attach(parent, child, at);
        Ok(())
    }

    /// Replace the last child of `parent` with `child`, or append if empty
    ///
    /// # Errors
    ///
    /// Returns error if either node is missing or the insertion would break
    /// the tree
    pub fn replace_last_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), DomError> {
        self.check_insert(parent, child)?;
        if let Some(&last) = self.children(parent).last() {
            if last == child {
                return Ok(());
            }
            self.detach(last);
        }
        self.detach(child);
        self.attach(parent, child, None);
        Ok(())
    }

    /// Detach `child` from its parent
    ///
    /// # Errors
    ///
    /// Returns error if the node is missing or already detached
    pub fn remove(&mut self, child: NodeKey) -> Result<(), DomError> {
        if self.get(child)?.parent.is_none() {
            return Err(DomError::NoParent(child));
        }
        if self.active.is_some_and(|a| self.is_inclusive_ancestor(child, a)) {
            self.blur();
        }
        self.detach(child);
        Ok(())
    }

    /// Set an attribute
    ///
    /// # Errors
    ///
    /// Returns error if the node is not an element or the name is not a valid
    /// attribute name
    pub fn set_attribute(&mut self, key: NodeKey, name: &str, value: &str) -> Result<(), DomError> {
        if !is_valid_attribute_name(name) {
            return Err(DomError::InvalidCharacter(name.to_string()));
        }
        let el = self.element_mut(key)?;
        el.attributes.insert(name.to_string(), value.to_string());
        Ok(())
    }

    /// Remove an attribute; removing an absent attribute is not an error
    ///
    /// # Errors
    ///
    /// Returns error if the node is not an element
    pub fn remove_attribute(&mut self, key: NodeKey, name: &str) -> Result<(), DomError> {
        self.element_mut(key)?.attributes.shift_remove(name);
        Ok(())
    }

    #[must_use]
    pub fn attribute(&self, key: NodeKey, name: &str) -> Option<&str> {
        self.element(key)
            .and_then(|el| el.attributes.get(name))
            .map(String::as_str)
    }

    /// Whether the element accepts a typed value (INPUT or TEXTAREA)
    #[must_use]
    pub fn is_input_like(&self, key: NodeKey) -> bool {
        self.element(key)
            .is_some_and(|el| el.is_html("INPUT") || el.is_html("TEXTAREA"))
    }

    /// Set the current value of an input-like element
    ///
    /// # Errors
    ///
    /// Returns error if the node is not an element
    pub fn set_value(&mut self, key: NodeKey, value: &str) -> Result<(), DomError> {
        let el = self.element_mut(key)?;
        el.value = value.to_string();
        el.pending_value = None;
        Ok(())
    }

    /// Hold a value until the element loses focus
    ///
    /// # Errors
    ///
    /// Returns error if the node is not an element
    pub fn defer_value(&mut self, key: NodeKey, value: &str) -> Result<(), DomError> {
        self.element_mut(key)?.pending_value = Some(value.to_string());
        Ok(())
    }

    /// # Errors
    ///
    /// Returns error if the node is not an element
    pub fn set_checked(&mut self, key: NodeKey, checked: bool) -> Result<(), DomError> {
        self.element_mut(key)?.checked = checked;
        Ok(())
    }

    /// Replace the character data of a text node
    ///
    /// # Errors
    ///
    /// Returns error if the node is missing or not a text node
    pub fn set_data(&mut self, key: NodeKey, data: &str) -> Result<(), DomError> {
        match &mut self.node_mut(key)?.kind {
            NodeKind::Text(text) => {
                text.clear();
                text.push_str(data);
                Ok(())
            }
            _ => Err(DomError::NotCharacterData(key)),
        }
    }

    /// Concatenated text of all descendant text nodes
    #[must_use]
    pub fn text_content(&self, key: NodeKey) -> String {
        let mut out = String::new();
        self.collect_text(key, &mut out);
        out
    }

    fn collect_text(&self, key: NodeKey, out: &mut String) {
        if let Some(node) = self.node(key) {
            if let NodeKind::Text(text) = &node.kind {
                out.push_str(text);
            }
            for &child in &node.children {
                self.collect_text(child, out);
            }
        }
    }

    #[must_use]
    pub fn sheet(&self, key: NodeKey) -> Option<&StyleSheet> {
        self.element(key).and_then(|el| el.sheet.as_ref())
    }

    /// Rule list of a STYLE element, for editing
    pub fn sheet_mut(&mut self, key: NodeKey) -> Option<&mut StyleSheet> {
        self.element_mut(key).ok().and_then(|el| el.sheet.as_mut())
    }

    /// Whether `key` is a STYLE element
    #[must_use]
    pub fn is_style(&self, key: NodeKey) -> bool {
        self.element(key).is_some_and(|el| el.is_html("STYLE"))
    }

    /// Set scroll offsets
    ///
    /// # Errors
    ///
    /// Returns error if the node is not an element
    pub fn set_scroll(&mut self, key: NodeKey, left: i64, top: i64) -> Result<(), DomError> {
        self.element_mut(key)?.scroll = ScrollOffset { left, top };
        Ok(())
    }

    #[must_use]
    pub fn scroll(&self, key: NodeKey) -> Option<ScrollOffset> {
        self.element(key).map(|el| el.scroll)
    }

    /// Lock an element against scrolling
    ///
    /// # Errors
    ///
    /// Returns error if the node is not an element
    pub fn lock_scroll(&mut self, key: NodeKey) -> Result<(), DomError> {
        self.element_mut(key)?.scroll_locked = true;
        Ok(())
    }

    /// Whether the node is reachable from a document root through parents
    #[must_use]
    pub fn is_connected(&self, key: NodeKey) -> bool {
        self.connected_within(key, &mut Vec::new())
    }

    fn connected_within(&self, key: NodeKey, seen_documents: &mut Vec<NodeKey>) -> bool {
        let mut current = key;
        loop {
            let Some(node) = self.node(current) else {
                return false;
            };
            match (&node.kind, node.parent) {
                (NodeKind::Document, _) => {
                    if current == self.root {
                        return true;
                    }
                    // a frame nested inside its own document never connects
                    if seen_documents.contains(&current) {
                        return false;
                    }
                    seen_documents.push(current);
                    return self
                        .frame_host(current)
                        .is_some_and(|host| self.connected_within(host, seen_documents));
                }
                (NodeKind::ShadowRoot { host }, _) => current = *host,
                (_, Some(parent)) => current = parent,
                (_, None) => return false,
            }
        }
    }

    fn frame_host(&self, document: NodeKey) -> Option<NodeKey> {
        self.nodes
            .iter()
            .position(|n| n.as_element().is_some_and(|el| el.content_document == Some(document)))
            .map(NodeKey)
    }

    /// Nested document of an IFRAME element
    ///
    /// Bound from creation, so a frame built inside a detached subtree can be
    /// filled before the subtree is mounted.
    #[must_use]
    pub fn content_document(&self, key: NodeKey) -> Option<NodeKey> {
        self.element(key)?.content_document
    }

    /// Attach an isolated subtree root to `host`
    ///
    /// # Errors
    ///
    /// Returns `NotSupported` if the element cannot host a shadow root or
    /// already has one
    pub fn attach_shadow(&mut self, host: NodeKey) -> Result<NodeKey, DomError> {
        let el = self.element(host).ok_or(DomError::NotElement(host))?;
        let allowed = el.namespace == Namespace::Html
            && (el.tag.contains('-')
                || SHADOW_HOSTS.iter().any(|t| el.tag.eq_ignore_ascii_case(t)));
        if !allowed {
            return Err(DomError::NotSupported("element cannot host a shadow root"));
        }
        if el.shadow_root.is_some() {
            return Err(DomError::NotSupported("shadow root already attached"));
        }
        let shadow = self.alloc(NodeKind::ShadowRoot { host });
        self.element_mut(host)?.shadow_root = Some(shadow);
        Ok(shadow)
    }

    #[must_use]
    pub const fn active_element(&self) -> Option<NodeKey> {
        self.active
    }

    /// Give remote-control focus to an element
    ///
    /// # Errors
    ///
    /// Returns error if the node is not an element
    pub fn focus(&mut self, key: NodeKey) -> Result<(), DomError> {
        self.element_mut(key)?;
        if self.active != Some(key) {
            self.blur();
        }
        self.active = Some(key);
        Ok(())
    }

    /// Drop focus, committing any value held back while focused
    pub fn blur(&mut self) {
        if let Some(key) = self.active.take() {
            if let Ok(el) = self.element_mut(key) {
                if let Some(value) = el.pending_value.take() {
                    el.value = value;
                }
            }
        }
    }

    /// Connected elements matching an HTML tag, in tree order
    #[must_use]
    pub fn find_by_tag(&self, tag: &str) -> Vec<NodeKey> {
        let mut out = Vec::new();
        self.walk(self.root, &mut |doc, key| {
            if doc.element(key).is_some_and(|el| el.is_html(tag)) {
                out.push(key);
            }
        });
        out
    }

    /// Depth-first walk over a subtree, descending into frames and shadow roots
    pub fn walk<F: FnMut(&Self, NodeKey)>(&self, key: NodeKey, visit: &mut F) {
        let Some(node) = self.node(key) else {
            return;
        };
        visit(self, key);
        if let Some(el) = node.as_element() {
            for inner in [el.shadow_root, el.content_document].into_iter().flatten() {
                self.walk(inner, visit);
            }
        }
        for &child in &node.children {
            self.walk(child, visit);
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Attribute names must look like XML names
fn is_valid_attribute_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_' || first == ':')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn html_of(doc: &Document) -> NodeKey {
        doc.children(doc.root())[0]
    }

    #[test]
    fn test_new_document_has_placeholder_html() {
        let doc = Document::new();
        assert_eq!(doc.children(doc.root()).len(), 1);
        assert!(doc.element(html_of(&doc)).unwrap().is_html("html"));
    }

    #[test]
    fn test_insert_before_and_append() {
        let mut doc = Document::new();
        let html = html_of(&doc);
        let a = doc.create_element("DIV", Namespace::Html);
        let b = doc.create_element("P", Namespace::Html);
        let c = doc.create_text("x");
        doc.insert_before(html, a, 0).unwrap();
        doc.insert_before(html, c, 99).unwrap();
        doc.insert_before(html, b, 0).unwrap();
        assert_eq!(doc.children(html), &[b, a, c]);
        assert_eq!(doc.parent(c), Some(html));
    }

    #[test]
    fn test_move_within_same_parent() {
        let mut doc = Document::new();
        let html = html_of(&doc);
        let keys: Vec<_> = (0..3)
            .map(|_| doc.create_element("SPAN", Namespace::Html))
            .collect();
        for k in &keys {
            doc.insert_before(html, *k, usize::MAX).unwrap();
        }
        // move the last span in front of the second
        doc.insert_before(html, keys[2], 1).unwrap();
        assert_eq!(doc.children(html), &[keys[0], keys[2], keys[1]]);
    }

    #[test]
    fn test_hierarchy_errors() {
        let mut doc = Document::new();
        let html = html_of(&doc);
        let text = doc.create_text("t");
        let div = doc.create_element("DIV", Namespace::Html);
        doc.insert_before(html, div, 0).unwrap();
        assert!(matches!(
            doc.insert_before(text, div, 0),
            Err(DomError::HierarchyRequest(_))
        ));
        assert!(matches!(
            doc.insert_before(div, html, 0),
            Err(DomError::HierarchyRequest(_))
        ));
        assert!(matches!(
            doc.insert_before(html, NodeKey(999), 0),
            Err(DomError::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_replace_last_child() {
        let mut doc = Document::new();
        let root = doc.root();
        let old = html_of(&doc);
        let html = doc.create_element("HTML", Namespace::Html);
        doc.replace_last_child(root, html).unwrap();
        assert_eq!(doc.children(root), &[html]);
        assert_eq!(doc.parent(old), None);
    }

    #[test]
    fn test_remove() {
        let mut doc = Document::new();
        let html = html_of(&doc);
        let div = doc.create_element("DIV", Namespace::Html);
        assert_eq!(doc.remove(div), Err(DomError::NoParent(div)));
        doc.insert_before(html, div, 0).unwrap();
        doc.remove(div).unwrap();
        assert!(doc.children(html).is_empty());
    }

    #[test]
    fn test_attributes() {
        let mut doc = Document::new();
        let div = doc.create_element("DIV", Namespace::Html);
        doc.set_attribute(div, "data-x", "1").unwrap();
        assert_eq!(doc.attribute(div, "data-x"), Some("1"));
        assert!(matches!(
            doc.set_attribute(div, "1bad", "v"),
            Err(DomError::InvalidCharacter(_))
        ));
        doc.remove_attribute(div, "data-x").unwrap();
        doc.remove_attribute(div, "data-x").unwrap();
        assert_eq!(doc.attribute(div, "data-x"), None);

        let text = doc.create_text("t");
        assert_eq!(doc.set_attribute(text, "a", "b"), Err(DomError::NotElement(text)));
    }

    #[test]
    fn test_stylesheet_rules() {
        let mut sheet = StyleSheet::new();
        sheet.insert_rule("a { color: red }", 0).unwrap();
        sheet.insert_rule("b { color: blue }", 0).unwrap();
        assert_eq!(sheet.rules()[0], "b { color: blue }");
        assert!(matches!(
            sheet.insert_rule("c {}", 5),
            Err(DomError::IndexSize { index: 5, len: 2 })
        ));
        assert!(matches!(sheet.insert_rule("not a rule", 0), Err(DomError::Syntax(_))));
        sheet.delete_rule(1).unwrap();
        assert!(sheet.delete_rule(1).is_err());
        assert_eq!(sheet.len(), 1);
    }

    #[test]
    fn test_stylesheet_parse() {
        let sheet = StyleSheet::parse(
            "@import url(x.css);\n a { color: red }\n@media print { b { x: y } }\n c {",
        );
        assert_eq!(
            sheet.rules(),
            &[
                "@import url(x.css);".to_string(),
                "a { color: red }".to_string(),
                "@media print { b { x: y } }".to_string(),
            ]
        );
    }

    #[test]
    fn test_style_element_has_sheet() {
        let mut doc = Document::new();
        let style = doc.create_element("style", Namespace::Html);
        assert!(doc.is_style(style));
        assert!(doc.sheet(style).unwrap().is_empty());
        let svg_style = doc.create_element("style", Namespace::Svg);
        assert!(doc.sheet(svg_style).is_none());
    }

    #[test]
    fn test_set_data() {
        let mut doc = Document::new();
        let text = doc.create_text("");
        doc.set_data(text, "hello").unwrap();
        assert_eq!(doc.text_content(text), "hello");
        let div = doc.create_element("DIV", Namespace::Html);
        assert_eq!(doc.set_data(div, "x"), Err(DomError::NotCharacterData(div)));
    }

    #[test]
    fn test_iframe_content_document_bound_while_detached() {
        let mut doc = Document::new();
        let html = html_of(&doc);
        let frame = doc.create_element("IFRAME", Namespace::Html);
        let inner = doc.content_document(frame).unwrap();
        assert!(!doc.is_connected(inner));
        assert_eq!(doc.children(inner).len(), 1);

        doc.insert_before(html, frame, 0).unwrap();
        assert_eq!(doc.content_document(frame), Some(inner));
        assert!(doc.is_connected(inner));

        let div = doc.create_element("DIV", Namespace::Html);
        assert_eq!(doc.content_document(div), None);
    }

    #[test]
    fn test_attach_shadow() {
        let mut doc = Document::new();
        let div = doc.create_element("DIV", Namespace::Html);
        let shadow = doc.attach_shadow(div).unwrap();
        assert_eq!(doc.element(div).unwrap().shadow_root, Some(shadow));
        assert!(matches!(doc.attach_shadow(div), Err(DomError::NotSupported(_))));

        let input = doc.create_element("INPUT", Namespace::Html);
        assert!(matches!(doc.attach_shadow(input), Err(DomError::NotSupported(_))));

        let custom = doc.create_element("my-widget", Namespace::Html);
        assert!(doc.attach_shadow(custom).is_ok());
    }

    #[test]
    fn test_focus_defers_value_until_blur() {
        let mut doc = Document::new();
        let input = doc.create_element("INPUT", Namespace::Html);
        doc.focus(input).unwrap();
        doc.defer_value(input, "later").unwrap();
        assert_eq!(doc.element(input).unwrap().value, "");
        doc.blur();
        assert_eq!(doc.element(input).unwrap().value, "later");
        assert_eq!(doc.active_element(), None);
    }

    #[test]
    fn test_find_by_tag() {
        let mut doc = Document::new();
        let html = html_of(&doc);
        let body = doc.create_element("BODY", Namespace::Html);
        let detached = doc.create_element("BODY", Namespace::Html);
        doc.insert_before(html, body, 0).unwrap();
        assert_eq!(doc.find_by_tag("body"), vec![body]);
        assert!(!doc.find_by_tag("body").contains(&detached));
    }

    #[test]
    fn test_reset() {
        let mut doc = Document::new();
        let html = html_of(&doc);
        let div = doc.create_element("DIV", Namespace::Html);
        doc.insert_before(html, div, 0).unwrap();
        let root = doc.reset();
        assert_eq!(root, doc.root());
        assert_eq!(doc, Document::new());
    }
}
