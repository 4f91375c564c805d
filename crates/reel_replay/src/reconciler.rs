//! Node reconciler.
//!
//! Keeps the host document in step with a recorded message log. Structural
//! messages go through one time-indexed cursor; scroll messages are kept per
//! node and only the latest one at or before the target time is applied, after
//! styles have settled.
//!
//! The body element is held back until the end of each structural pass so
//! style rewrites never run against a half-built, already connected body.

use crate::config::{AttributeFilter, AttributeRejection, ConfigError, ReplayConfig};
use crate::dom::{Document, DomError, Namespace, NodeKey, SharedDocument};
use crate::styles::{StyleCoordinator, StylesManager};
use indexmap::IndexMap;
use reel_core::{CoreError, NodeId, SessionTime};
use reel_log::message::{CreateElementNode, Message, SetNodeScroll};
use reel_log::TimedEventCursor;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Weak;
use thiserror::Error;
use tracing::{debug, warn};

/// Failures that stop a settle pass
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    /// The host dropped its document
    #[error("Host document is gone")]
    ScreenDetached,
    /// The host document was borrowed while the reconciler needed it
    #[error("Host document is borrowed elsewhere")]
    ScreenBusy,
}

impl From<ReplayError> for CoreError {
    fn from(err: ReplayError) -> Self {
        CoreError::Replay {
            reason: err.to_string(),
        }
    }
}

/// Per-message failures; logged and skipped
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    /// No live node is bound to the recorded id
    #[error("Node {0} is not mapped")]
    NodeNotFound(NodeId),
    /// No live node is bound to the recorded parent id
    #[error("Parent {0} is not mapped")]
    ParentNotFound(NodeId),
    /// Input value sent to something other than INPUT or TEXTAREA
    #[error("Node {0} does not take input values")]
    NotInputLike(NodeId),
    /// Rule edit sent to something other than a STYLE element
    #[error("Node {0} has no stylesheet")]
    NotStyleNode(NodeId),
    /// STYLE parent whose rules were inserted without text
    #[error("Style node {0} holds injected rules and refuses children")]
    VirtualRules(NodeId),
    /// IFRAME without a nested document
    #[error("Frame {0} has no document")]
    NoFrameDocument(NodeId),
    /// Nested document requested for a non-element node
    #[error("Frame host {0} is not an element")]
    HostNotElement(NodeId),
    /// Host document dropped or borrowed elsewhere
    #[error("Host document is gone or busy")]
    ScreenUnavailable,
    /// Host document refused the operation
    #[error(transparent)]
    Dom(#[from] DomError),
}

/// Diagnostic counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Attribute messages dropped on append
    pub dropped_attributes: usize,
    /// Messages skipped during apply
    pub failures: usize,
}

/// Result of a settle pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleReport {
    /// Target time of the pass
    pub time: SessionTime,
    /// Structural messages applied in this pass
    pub applied: usize,
    /// Whether a held-back body was mounted
    pub body_mounted: bool,
    /// Scroll positions written
    pub scrolls_restored: usize,
}

/// Node table and everything applying a message can touch
struct TreeState {
    screen: Weak<RefCell<Document>>,
    styles: Box<dyn StyleCoordinator>,
    nodes: HashMap<NodeId, NodeKey>,
    links: HashSet<NodeId>,
    body_id: Option<NodeId>,
    postponed_body: Option<CreateElementNode>,
    mask_char: char,
    asset_origin: Option<String>,
    mobile: bool,
    stats: ReplayStats,
}

impl TreeState {
    fn apply_message(&mut self, msg: &Message) -> Result<(), ReplayError> {
        let Some(screen) = self.screen.upgrade() else {
            if matches!(msg, Message::CreateDocument(_)) {
                return Err(ReplayError::ScreenDetached);
            }
            warn!(kind = msg.kind_name(), id = %msg.id(), time = %msg.time(), "host document gone, message skipped");
            self.stats.failures += 1;
            return Ok(());
        };
        let mut doc = screen
            .try_borrow_mut()
            .map_err(|_| ReplayError::ScreenBusy)?;

        if let Err(err) = self.apply_to(&mut doc, msg) {
            warn!(
                kind = msg.kind_name(),
                id = %msg.id(),
                time = %msg.time(),
                error = %err,
                "message skipped"
            );
            self.stats.failures += 1;
        }
        Ok(())
    }

    fn lookup(&self, id: NodeId) -> Result<NodeKey, ApplyError> {
        self.nodes.get(&id).copied().ok_or(ApplyError::NodeNotFound(id))
    }

    fn apply_to(&mut self, doc: &mut Document, msg: &Message) -> Result<(), ApplyError> {
        match msg {
            Message::CreateDocument(_) => {
                let root = doc.reset();
                self.nodes.clear();
                self.nodes.insert(NodeId::ROOT, root);
                self.postponed_body = None;
                self.styles.reset();
                debug!(time = %msg.time(), "document recreated");
                Ok(())
            }
            Message::CreateTextNode(m) => {
                let key = doc.create_text("");
                self.nodes.insert(m.id, key);
                self.insert_node(doc, m.id, m.parent_id, m.index)
            }
            Message::CreateElementNode(m) => self.create_element(doc, m),
            Message::MoveNode(m) => self.insert_node(doc, m.id, m.parent_id, m.index),
            Message::RemoveNode(m) => {
                let key = self.lookup(m.id)?;
                doc.remove(key)?;
                Ok(())
            }
            Message::SetNodeAttribute(m) => {
                let key = self.lookup(m.id)?;
                let mut value = m.value.clone();
                if m.name == "href" && self.links.contains(&m.id) {
                    if self
                        .asset_origin
                        .as_deref()
                        .is_some_and(|origin| value.starts_with(origin))
                    {
                        value = value.replacen('?', "%3F", 1);
                    }
                    self.styles.register_link_node(key, &value);
                }
                let is_svg = doc
                    .element(key)
                    .is_some_and(|el| el.namespace == Namespace::Svg);
                if is_svg && value.starts_with("url(") {
                    value = format!("url(#{}", value.split('#').nth(1).unwrap_or(")"));
                }
                doc.set_attribute(key, &m.name, &value)?;
                Ok(())
            }
            Message::RemoveNodeAttribute(m) => {
                let key = self.lookup(m.id)?;
                doc.remove_attribute(key, &m.name)?;
                Ok(())
            }
            Message::SetInputValue(m) => {
                let key = self.lookup(m.id)?;
                if !doc.is_input_like(key) {
                    return Err(ApplyError::NotInputLike(m.id));
                }
                let value = if m.mask > 0 {
                    std::iter::repeat_n(self.mask_char, m.mask as usize).collect()
                } else {
                    m.value.clone()
                };
                if doc.active_element() == Some(key) {
                    debug!(id = %m.id, "input focused, value deferred");
                    doc.defer_value(key, &value)?;
                } else {
                    doc.set_value(key, &value)?;
                }
                Ok(())
            }
            Message::SetInputChecked(m) => {
                let key = self.lookup(m.id)?;
                doc.set_checked(key, m.checked)?;
                Ok(())
            }
            Message::SetNodeData(m) | Message::SetCssData(m) => {
                let key = self.lookup(m.id)?;
                doc.set_data(key, &m.data)?;
                if let Some(style) = doc.parent(key).filter(|p| doc.is_style(*p)) {
                    self.styles.rewrite_style_node(doc, style);
                }
                Ok(())
            }
            Message::CssInsertRule(m) => {
                let key = self.lookup(m.id)?;
                let sheet = doc.sheet_mut(key).ok_or(ApplyError::NotStyleNode(m.id))?;
                if let Err(err) = sheet.insert_rule(&m.rule, m.index) {
                    warn!(id = %m.id, index = m.index, error = %err, "rule insert failed, appending");
                    let end = sheet.len();
                    sheet.insert_rule(&m.rule, end)?;
                }
                Ok(())
            }
            Message::CssDeleteRule(m) => {
                let key = self.lookup(m.id)?;
                let sheet = doc.sheet_mut(key).ok_or(ApplyError::NotStyleNode(m.id))?;
                sheet.delete_rule(m.index)?;
                Ok(())
            }
            Message::CreateIFrameDocument(m) => {
                let host = self.lookup(m.frame_id)?;
                let el = doc
                    .element(host)
                    .ok_or(ApplyError::HostNotElement(m.frame_id))?;
                let inner = if el.is_html("IFRAME") {
                    doc.content_document(host)
                        .ok_or(ApplyError::NoFrameDocument(m.frame_id))?
                } else {
                    doc.attach_shadow(host)?
                };
                self.nodes.insert(m.id, inner);
                Ok(())
            }
            Message::SetNodeScroll(m) => {
                let key = self.lookup(m.id)?;
                doc.set_scroll(key, m.x, m.y)?;
                Ok(())
            }
        }
    }

    fn create_element(&mut self, doc: &mut Document, m: &CreateElementNode) -> Result<(), ApplyError> {
        let namespace = if m.svg { Namespace::Svg } else { Namespace::Html };
        let key = doc.create_element(&m.tag, namespace);
        self.nodes.insert(m.id, key);

        if namespace == Namespace::Html {
            let tag = m.tag.to_ascii_uppercase();
            match tag.as_str() {
                "FORM" | "TEXTAREA" | "SELECT" => doc.set_attribute(key, "autocomplete", "off")?,
                "INPUT" => doc.set_attribute(key, "autocomplete", "new-password")?,
                _ => {}
            }
        }

        if self.body_id == Some(m.id) {
            if self.mobile {
                doc.lock_scroll(key)?;
            }
            debug!(id = %m.id, "body held until end of pass");
            self.postponed_body = Some(m.clone());
            return Ok(());
        }
        self.insert_node(doc, m.id, m.parent_id, m.index)
    }

    fn insert_node(
        &self,
        doc: &mut Document,
        id: NodeId,
        parent_id: NodeId,
        index: usize,
    ) -> Result<(), ApplyError> {
        let key = self.lookup(id)?;
        let parent = self
            .nodes
            .get(&parent_id)
            .copied()
            .ok_or(ApplyError::ParentNotFound(parent_id))?;

        let virtual_rules = doc.sheet(parent).is_some_and(|sheet| !sheet.is_empty())
            && doc.text_content(parent).trim().is_empty();
        if virtual_rules {
            return Err(ApplyError::VirtualRules(parent_id));
        }

        if doc.element(key).is_some_and(|el| el.is_html("HTML")) {
            doc.replace_last_child(parent, key)?;
        } else {
            doc.insert_before(parent, key, index)?;
        }
        Ok(())
    }

    fn mount_postponed_body(&mut self) -> Result<bool, ReplayError> {
        let Some(body) = self.postponed_body.take() else {
            return Ok(false);
        };
        let Some(screen) = self.screen.upgrade() else {
            warn!(id = %body.id, "host document gone, body not mounted");
            return Ok(false);
        };
        let mut doc = screen
            .try_borrow_mut()
            .map_err(|_| ReplayError::ScreenBusy)?;
        match self.insert_node(&mut doc, body.id, body.parent_id, body.index) {
            Ok(()) => Ok(true),
            Err(err) => {
                warn!(id = %body.id, time = %body.time, error = %err, "body mount failed");
                self.stats.failures += 1;
                Ok(false)
            }
        }
    }
}

/// Reconciles a recorded message log into a host document
pub struct NodeReconciler {
    filter: AttributeFilter,
    structure: TimedEventCursor<Message>,
    scrolls: IndexMap<NodeId, TimedEventCursor<SetNodeScroll>>,
    tree: TreeState,
}

impl std::fmt::Debug for NodeReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeReconciler")
            .field("messages", &self.structure.len())
            .field("position", &self.structure.position())
            .field("scroll_streams", &self.scrolls.len())
            .field("nodes", &self.tree.nodes.len())
            .field("stats", &self.tree.stats)
            .finish_non_exhaustive()
    }
}

impl NodeReconciler {
    /// Reconciler writing into `screen`, with the default style coordinator
    ///
    /// Only a weak handle is kept; the host owns the document.
    ///
    /// # Errors
    ///
    /// Returns error if the attribute name pattern does not compile
    pub fn new(screen: &SharedDocument, config: &ReplayConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            filter: config.attribute_filter()?,
            structure: TimedEventCursor::new(),
            scrolls: IndexMap::new(),
            tree: TreeState {
                screen: std::rc::Rc::downgrade(screen),
                styles: Box::new(StylesManager::new()),
                nodes: HashMap::new(),
                links: HashSet::new(),
                body_id: None,
                postponed_body: None,
                mask_char: config.mask_char,
                asset_origin: config.asset_origin.clone(),
                mobile: config.mobile,
                stats: ReplayStats::default(),
            },
        })
    }

    /// Replace the style coordinator
    #[must_use]
    pub fn with_styles(mut self, styles: impl StyleCoordinator + 'static) -> Self {
        self.set_styles(styles);
        self
    }

    /// Replace the style coordinator in place
    pub fn set_styles(&mut self, styles: impl StyleCoordinator + 'static) {
        self.tree.styles = Box::new(styles);
    }

    /// Enqueue a recorded message
    ///
    /// Never touches the host document.
    pub fn append(&mut self, msg: Message) {
        match &msg {
            Message::SetNodeScroll(scroll) => {
                self.scrolls.entry(scroll.id).or_default().append(*scroll);
                return;
            }
            Message::CreateElementNode(m) if !m.svg => {
                if m.tag.eq_ignore_ascii_case("LINK") {
                    self.tree.links.insert(m.id);
                } else if m.tag.eq_ignore_ascii_case("BODY") {
                    self.tree.body_id = Some(m.id);
                }
            }
            Message::SetNodeAttribute(m) => {
                if let Err(rejection) = self.filter.check(&m.name) {
                    match rejection {
                        AttributeRejection::Ignored => {
                            debug!(id = %m.id, name = %m.name, "ignored attribute dropped");
                        }
                        AttributeRejection::UnsafeName => {
                            warn!(id = %m.id, name = ?m.name, "unsafe attribute name dropped");
                        }
                    }
                    self.tree.stats.dropped_attributes += 1;
                    return;
                }
            }
            _ => {}
        }
        self.structure.append(msg);
    }

    /// Bring the host document to its recorded state at `t`
    ///
    /// Structural messages are applied first, then a held-back body is
    /// mounted, then the style coordinator is awaited, and only then are
    /// scroll positions restored.
    ///
    /// # Errors
    ///
    /// Returns error if the host document is gone while recreating it, or is
    /// borrowed elsewhere during the pass
    pub async fn settle(&mut self, t: SessionTime) -> Result<SettleReport, ReplayError> {
        let applied = self
            .structure
            .advance_to(t, |msg| self.tree.apply_message(msg))?;
        let body_mounted = self.tree.mount_postponed_body()?;
        debug!(time = %t, applied, body_mounted, "structure settled");

        self.tree.styles.settle(t).await;

        let scrolls_restored = self.restore_scroll(t)?;
        Ok(SettleReport {
            time: t,
            applied,
            body_mounted,
            scrolls_restored,
        })
    }

    fn restore_scroll(&mut self, t: SessionTime) -> Result<usize, ReplayError> {
        let Some(screen) = self.tree.screen.upgrade() else {
            return Ok(0);
        };
        let mut doc = screen
            .try_borrow_mut()
            .map_err(|_| ReplayError::ScreenBusy)?;
        let mut restored = 0;
        for (id, stream) in &self.scrolls {
            let Some(&key) = self.tree.nodes.get(id) else {
                continue;
            };
            // no scroll recorded yet at t: back to the origin
            let Some(scroll) = stream.last_at_or_before(t) else {
                if let Err(err) = doc.set_scroll(key, 0, 0) {
                    debug!(id = %id, error = %err, "scroll not reset");
                }
                continue;
            };
            match doc.set_scroll(key, scroll.x, scroll.y) {
                Ok(()) => restored += 1,
                Err(err) => debug!(id = %id, error = %err, "scroll not restored"),
            }
        }
        Ok(restored)
    }

    /// Give remote-control focus to a recorded node
    ///
    /// # Errors
    ///
    /// Returns error if the node is unmapped or not an element
    pub fn focus(&mut self, id: NodeId) -> Result<(), ApplyError> {
        let key = self.tree.lookup(id)?;
        let screen = self.tree.screen.upgrade().ok_or(ApplyError::ScreenUnavailable)?;
        let mut doc = screen
            .try_borrow_mut()
            .map_err(|_| ApplyError::ScreenUnavailable)?;
        doc.focus(key)?;
        Ok(())
    }

    /// Drop remote-control focus, committing any deferred input value
    pub fn blur(&mut self) {
        let Some(screen) = self.tree.screen.upgrade() else {
            return;
        };
        match screen.try_borrow_mut() {
            Ok(mut doc) => doc.blur(),
            Err(_) => warn!("host document busy, blur skipped"),
        };
    }

    /// Host node currently bound to a recorded id
    #[must_use]
    pub fn node_key(&self, id: NodeId) -> Option<NodeKey> {
        self.tree.nodes.get(&id).copied()
    }

    /// Shared handle to the host document, if the host still holds it
    #[must_use]
    pub fn screen(&self) -> Option<SharedDocument> {
        self.tree.screen.upgrade()
    }

    /// Counters accumulated since construction
    #[must_use]
    pub const fn stats(&self) -> ReplayStats {
        self.tree.stats
    }

    /// Recorded id of the BODY element, once seen
    #[must_use]
    pub const fn body_id(&self) -> Option<NodeId> {
        self.tree.body_id
    }

    /// Whether the recorded id names a LINK element
    #[must_use]
    pub fn is_link(&self, id: NodeId) -> bool {
        self.tree.links.contains(&id)
    }

    /// Structural messages queued
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.structure.len()
    }

    /// Structural messages applied so far
    #[must_use]
    pub const fn position(&self) -> usize {
        self.structure.position()
    }

    /// Nodes with recorded scroll positions
    #[must_use]
    pub fn scroll_stream_count(&self) -> usize {
        self.scrolls.len()
    }

    /// Time of the last recorded message of any kind
    #[must_use]
    pub fn end_time(&self) -> Option<SessionTime> {
        self.scrolls
            .values()
            .filter_map(TimedEventCursor::end_time)
            .chain(self.structure.end_time())
            .max()
    }
}
