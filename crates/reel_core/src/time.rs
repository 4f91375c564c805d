//! Recording clock.
//!
//! Every recorded message is stamped with milliseconds since the start of the
//! recording. Replay never consults the wall clock.

use serde::{Deserialize, Serialize};

/// Milliseconds since the recording started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionTime(u64);

impl SessionTime {
    /// Start of the recording
    #[must_use]
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Create from milliseconds
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Get milliseconds
    #[must_use]
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Milliseconds elapsed since an earlier time, zero if `earlier` is later
    #[must_use]
    pub const fn saturating_since(&self, earlier: SessionTime) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl Default for SessionTime {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for SessionTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

impl From<u64> for SessionTime {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
