//! Replay session.
//!
//! Owns the reconciler for one recording. The host document is borrowed
//! through a weak handle and outlives the session.

use crate::config::{ConfigError, ReplayConfig};
use crate::dom::SharedDocument;
use crate::reconciler::{ApplyError, NodeReconciler, ReplayError, SettleReport};
use crate::snapshot::TreeSnapshot;
use crate::styles::StyleCoordinator;
use reel_core::{CoreResult, NodeId, SessionId, SessionTime};
use reel_log::{decode_chunk, load_chunks, ChunkSource, LoadError, LoadOutcome, Message};
use tracing::info;

/// Replay of a single recorded session
#[derive(Debug)]
pub struct ReplaySession {
    id: SessionId,
    reconciler: NodeReconciler,
    settled_at: Option<SessionTime>,
}

impl ReplaySession {
    /// Open a session writing into `screen`
    ///
    /// # Errors
    ///
    /// Returns error if the configuration does not compile
    pub fn new(screen: &SharedDocument, config: &ReplayConfig) -> Result<Self, ConfigError> {
        Self::with_id(SessionId::new(), screen, config)
    }

    /// Open a session with a known id
    ///
    /// # Errors
    ///
    /// Returns error if the configuration does not compile
    pub fn with_id(
        id: SessionId,
        screen: &SharedDocument,
        config: &ReplayConfig,
    ) -> Result<Self, ConfigError> {
        let reconciler = NodeReconciler::new(screen, config)?;
        info!(session = %id, mobile = config.mobile, "replay session opened");
        Ok(Self {
            id,
            reconciler,
            settled_at: None,
        })
    }

    /// Replace the style coordinator
    #[must_use]
    pub fn with_styles(mut self, styles: impl StyleCoordinator + 'static) -> Self {
        self.reconciler.set_styles(styles);
        self
    }

    /// Id stamped on snapshots and log lines
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Underlying reconciler, for counters and node lookups
    #[must_use]
    pub const fn reconciler(&self) -> &NodeReconciler {
        &self.reconciler
    }

    /// Time of the last completed settle
    #[must_use]
    pub const fn settled_at(&self) -> Option<SessionTime> {
        self.settled_at
    }

    /// Enqueue one message
    pub fn append(&mut self, msg: Message) {
        self.reconciler.append(msg);
    }

    /// Fetch, decode and enqueue every chunk of the recording
    ///
    /// # Errors
    ///
    /// Returns error if the loader fails or a chunk does not decode
    pub async fn load<S>(&mut self, source: &S, locations: &[String]) -> CoreResult<LoadOutcome>
    where
        S: ChunkSource + ?Sized,
    {
        let reconciler = &mut self.reconciler;
        let mut messages = 0usize;
        let outcome = load_chunks(source, locations, |location, body| {
            let decoded = decode_chunk(&body).map_err(|source| LoadError::Decode {
                location: location.to_string(),
                source,
            })?;
            messages += decoded.len();
            for msg in decoded {
                reconciler.append(msg);
            }
            Ok(())
        })
        .await?;
        info!(
            session = %self.id,
            chunks = outcome.chunks,
            messages,
            truncated = outcome.truncated,
            "recording loaded"
        );
        Ok(outcome)
    }

    /// Bring the host document to time `t`
    ///
    /// # Errors
    ///
    /// Returns error if the host document is gone or busy
    pub async fn settle(&mut self, t: SessionTime) -> CoreResult<SettleReport> {
        let report = self.reconciler.settle(t).await?;
        self.settled_at = Some(t);
        Ok(report)
    }

    /// Capture the host document as it stands
    ///
    /// # Errors
    ///
    /// Returns error if the host document is gone or mutably borrowed
    pub fn snapshot(&self) -> CoreResult<TreeSnapshot> {
        let screen = self.reconciler.screen().ok_or(ReplayError::ScreenDetached)?;
        let doc = screen.try_borrow().map_err(|_| ReplayError::ScreenBusy)?;
        let mut snapshot = TreeSnapshot::capture(&doc).with_session(self.id);
        if let Some(t) = self.settled_at {
            snapshot = snapshot.at(t);
        }
        Ok(snapshot)
    }

    /// Give remote-control focus to a recorded node
    ///
    /// # Errors
    ///
    /// Returns error if the node is unmapped or not an element
    pub fn focus(&mut self, id: NodeId) -> Result<(), ApplyError> {
        self.reconciler.focus(id)
    }

    /// Drop remote-control focus
    pub fn blur(&mut self) {
        self.reconciler.blur();
    }
}

impl Drop for ReplaySession {
    fn drop(&mut self) {
        info!(
            session = %self.id,
            messages = self.reconciler.message_count(),
            "replay session closed"
        );
    }
}
