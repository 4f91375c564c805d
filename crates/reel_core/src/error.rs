//! Core error types for REEL.

use thiserror::Error;

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error type
///
/// Each crate keeps its own detailed error enum and converts into this one at
/// crate boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Invalid encoding
    #[error("Invalid encoding: {reason}")]
    InvalidEncoding {
        /// What was wrong with the bytes
        reason: String,
    },

    /// Fetching recorded data failed
    #[error("Fetch failed for {location}: {reason}")]
    Fetch {
        /// Source location that failed
        location: String,
        /// Failure description
        reason: String,
    },

    /// Replay could not continue
    #[error("Replay failed: {reason}")]
    Replay {
        /// Failure description
        reason: String,
    },

    /// Invalid configuration
    #[error("Invalid configuration for {field}: {reason}")]
    Config {
        /// Offending field
        field: String,
        /// Why it was rejected
        reason: String,
    },

    /// Not found
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Kind of entity
        kind: String,
        /// Identifier that was looked up
        id: String,
    },

    /// Internal error (for unexpected errors)
    #[error("Internal error: {message}")]
    Internal {
        /// Error message
        message: String,
    },
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidEncoding {
            reason: err.to_string(),
        }
    }
}
