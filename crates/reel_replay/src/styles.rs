//! Stylesheet coordination.
//!
//! Fetching and URL-rewriting of stylesheets belongs to the host. The
//! reconciler only reports what it sees and waits for the coordinator to
//! settle before restoring scroll, since layout depends on loaded styles.

use crate::dom::{Document, NodeKey, StyleSheet};
use async_trait::async_trait;
use indexmap::IndexMap;
use reel_core::SessionTime;
use tracing::debug;

/// Collaborator that owns stylesheet loading
#[async_trait(?Send)]
pub trait StyleCoordinator {
    /// Forget everything; the document was recreated
    fn reset(&mut self);

    /// A stylesheet link now points at `url`
    fn register_link_node(&mut self, node: NodeKey, url: &str);

    /// Text of a STYLE element changed; rebuild its rules
    fn rewrite_style_node(&mut self, document: &mut Document, node: NodeKey);

    /// Resolve once stylesheet work due by `t` is done
    async fn settle(&mut self, t: SessionTime);
}

/// Load state of a stylesheet link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Registered, settle not yet awaited
    Pending,
    /// Settled
    Loaded,
}

/// Registered stylesheet link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
    pub url: String,
    pub state: LinkState,
}

/// Default coordinator
///
/// Tracks link registrations and treats them as loaded on the next settle.
/// STYLE text is re-parsed into the element's rule list.
#[derive(Debug, Default)]
pub struct StylesManager {
    links: IndexMap<NodeKey, LinkEntry>,
    settled_at: Option<SessionTime>,
}

impl StylesManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn link(&self, node: NodeKey) -> Option<&LinkEntry> {
        self.links.get(&node)
    }

    /// Links registered but not yet settled
    #[must_use]
    pub fn pending(&self) -> usize {
        self.links
            .values()
            .filter(|l| l.state == LinkState::Pending)
            .count()
    }

    #[must_use]
    pub const fn settled_at(&self) -> Option<SessionTime> {
        self.settled_at
    }
}

#[async_trait(?Send)]
impl StyleCoordinator for StylesManager {
    fn reset(&mut self) {
        self.links.clear();
        self.settled_at = None;
    }

    fn register_link_node(&mut self, node: NodeKey, url: &str) {
        self.links.insert(
            node,
            LinkEntry {
                url: url.to_string(),
                state: LinkState::Pending,
            },
        );
    }

    fn rewrite_style_node(&mut self, document: &mut Document, node: NodeKey) {
        let text = document.text_content(node);
        if let Some(sheet) = document.sheet_mut(node) {
            *sheet = StyleSheet::parse(&text);
            debug!(node = node.index(), rules = sheet.len(), "style node reparsed");
        }
    }

    async fn settle(&mut self, t: SessionTime) {
        let pending = self.pending();
        if pending > 0 {
            tokio::task::yield_now().await;
            for link in self.links.values_mut() {
                link.state = LinkState::Loaded;
            }
            debug!(time = %t, links = pending, "stylesheets settled");
        }
        self.settled_at = Some(t);
    }
}
