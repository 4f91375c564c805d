//! REEL Replay Engine
//!
//! Rebuilds a recorded page into a host document tree at any point in time.
//! Seeking forward applies only the new messages; seeking backward replays
//! from the start of the recording.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod dom;
pub mod reconciler;
pub mod session;
pub mod snapshot;
pub mod styles;

#[cfg(test)]
mod fixtures;

pub use config::{AttributeFilter, AttributeRejection, ConfigError, ReplayConfig};
pub use dom::{Document, DomError, Namespace, NodeKey, SharedDocument, StyleSheet};
pub use reconciler::{ApplyError, NodeReconciler, ReplayError, ReplayStats, SettleReport};
pub use session::ReplaySession;
pub use snapshot::{SnapshotError, SnapshotNode, TreeSnapshot};
pub use styles::{StyleCoordinator, StylesManager};
