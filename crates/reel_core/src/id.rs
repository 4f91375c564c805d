//! Identifiers for REEL entities.
//!
//! Node ids are assigned by the recorder and only ever read back by the
//! replay engine. Session ids are UUIDs minted when a replay view opens.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Recorded node identifier
///
/// Unique within one recording. The replay engine never allocates these; it
/// only maps them onto live nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// Id the recorder gives to the document root
    pub const ROOT: Self = Self(0);

    /// Create from the raw recorded value
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::ROOT
    }
}

impl From<u64> for NodeId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Replay session identifier - one per open replay view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Create a new random SessionId
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from UUID bytes
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Get as UUID
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session_{}", self.0)
    }
}
