//! Host tree snapshots.
//!
//! A snapshot is a plain, owned copy of the connected host tree. It is used
//! to compare replay results and to print them.

use crate::dom::{Document, Namespace, NodeKey, NodeKind, ScrollOffset};
use indexmap::IndexMap;
use reel_core::{CoreError, CoreResult, SessionId, SessionTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Snapshot errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("Corrupted snapshot: {reason}")]
    Corrupted { reason: String },
    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u32, actual: u32 },
}

impl From<SnapshotError> for CoreError {
    fn from(err: SnapshotError) -> Self {
        CoreError::InvalidEncoding {
            reason: err.to_string(),
        }
    }
}

/// One node of a captured tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SnapshotNode {
    Document {
        children: Vec<SnapshotNode>,
    },
    Element {
        tag: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        svg: bool,
        #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
        attributes: IndexMap<String, String>,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        value: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        checked: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scroll: Option<ScrollOffset>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        rules: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        shadow_root: Option<Box<SnapshotNode>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content_document: Option<Box<SnapshotNode>>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<SnapshotNode>,
    },
    Text {
        data: String,
    },
    ShadowRoot {
        children: Vec<SnapshotNode>,
    },
}

impl SnapshotNode {
    fn capture(doc: &Document, key: NodeKey) -> Option<Self> {
        let node = doc.node(key)?;
        let children = || -> Vec<Self> {
            node.children
                .iter()
                .filter_map(|&child| Self::capture(doc, child))
                .collect()
        };
        Some(match &node.kind {
            NodeKind::Document => Self::Document {
                children: children(),
            },
            NodeKind::ShadowRoot { .. } => Self::ShadowRoot {
                children: children(),
            },
            NodeKind::Text(data) => Self::Text { data: data.clone() },
            NodeKind::Element(el) => Self::Element {
                tag: el.tag.clone(),
                svg: el.namespace == Namespace::Svg,
                attributes: el.attributes.clone(),
                value: el.value.clone(),
                checked: el.checked,
                scroll: (el.scroll != ScrollOffset::default()).then_some(el.scroll),
                rules: el
                    .sheet
                    .as_ref()
                    .map(|sheet| sheet.rules().to_vec())
                    .unwrap_or_default(),
                shadow_root: el
                    .shadow_root
                    .and_then(|root| Self::capture(doc, root))
                    .map(Box::new),
                content_document: el
                    .content_document
                    .and_then(|inner| Self::capture(doc, inner))
                    .map(Box::new),
                children: children(),
            },
        })
    }

    /// Nodes in this subtree, including frames and shadow roots
    #[must_use]
    pub fn count(&self) -> usize {
        match self {
            Self::Text { .. } => 1,
            Self::Document { children } | Self::ShadowRoot { children } => {
                1 + children.iter().map(Self::count).sum::<usize>()
            }
            Self::Element {
                shadow_root,
                content_document,
                children,
                ..
            } => {
                1 + shadow_root.as_deref().map_or(0, Self::count)
                    + content_document.as_deref().map_or(0, Self::count)
                    + children.iter().map(Self::count).sum::<usize>()
            }
        }
    }

    fn render(&self, depth: usize, out: &mut Vec<String>) {
        let indent = "  ".repeat(depth);
        match self {
            Self::Document { children } => {
                out.push(format!("{indent}#document"));
                for child in children {
                    child.render(depth + 1, out);
                }
            }
            Self::ShadowRoot { children } => {
                out.push(format!("{indent}#shadow-root"));
                for child in children {
                    child.render(depth + 1, out);
                }
            }
            Self::Text { data } => out.push(format!("{indent}{data:?}")),
            Self::Element {
                tag,
                svg,
                attributes,
                value,
                checked,
                scroll,
                rules,
                shadow_root,
                content_document,
                children,
            } => {
                let mut line = format!("{indent}<{}{tag}", if *svg { "svg:" } else { "" });
                for (name, attr) in attributes {
                    line.push_str(&format!(" {name}={attr:?}"));
                }
                line.push('>');
                if !value.is_empty() {
                    line.push_str(&format!(" value={value:?}"));
                }
                if *checked {
                    line.push_str(" checked");
                }
                if let Some(scroll) = scroll {
                    line.push_str(&format!(" scroll={},{}", scroll.left, scroll.top));
                }
                if !rules.is_empty() {
                    line.push_str(&format!(" rules={}", rules.len()));
                }
                out.push(line);
                for inner in [shadow_root, content_document].into_iter().flatten() {
                    inner.render(depth + 1, out);
                }
                for child in children {
                    child.render(depth + 1, out);
                }
            }
        }
    }
}

/// Snapshot metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    /// Format version, checked on decode
    pub version: u32,
    /// Session the tree was replayed for
    pub session: Option<SessionId>,
    /// Replay time the tree reflects
    pub time: Option<SessionTime>,
    /// Nodes in the captured tree
    pub node_count: usize,
}

/// Captured host tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeSnapshot {
    pub metadata: SnapshotMetadata,
    pub root: SnapshotNode,
}

impl TreeSnapshot {
    /// Capture everything reachable from the document root
    #[must_use]
    pub fn capture(doc: &Document) -> Self {
        let root = SnapshotNode::capture(doc, doc.root()).unwrap_or(SnapshotNode::Document {
            children: Vec::new(),
        });
        Self {
            metadata: SnapshotMetadata {
                version: SNAPSHOT_VERSION,
                session: None,
                time: None,
                node_count: root.count(),
            },
            root,
        }
    }

    #[must_use]
    pub fn with_session(mut self, session: SessionId) -> Self {
        self.metadata.session = Some(session);
        self
    }

    #[must_use]
    pub fn at(mut self, time: SessionTime) -> Self {
        self.metadata.time = Some(time);
        self
    }

    /// Whether two snapshots hold the same tree, ignoring metadata
    #[must_use]
    pub fn same_tree(&self, other: &Self) -> bool {
        self.root == other.root
    }

    /// Indented text rendering, one node per line
    #[must_use]
    pub fn to_lines(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.root.render(0, &mut out);
        out
    }

    /// Encode snapshot to JSON bytes
    ///
    /// # Errors
    ///
    /// Returns error if encoding fails
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| {
            SnapshotError::Corrupted {
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Decode snapshot from JSON bytes
    ///
    /// # Errors
    ///
    /// Returns error if the bytes are not a snapshot or carry another version
    pub fn decode(data: &[u8]) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_slice(data).map_err(|e| SnapshotError::Corrupted {
            reason: e.to_string(),
        })?;
        if snapshot.metadata.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::VersionMismatch {
                expected: SNAPSHOT_VERSION,
                actual: snapshot.metadata.version,
            });
        }
        Ok(snapshot)
    }
}
