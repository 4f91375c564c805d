//! REEL Core Types
//!
//! Pure types shared by every crate in the workspace: recorded node ids,
//! replay session ids, the recording clock, and the core error type.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod id;
pub mod time;

// Re-exports
pub use error::{CoreError, CoreResult};
pub use id::{NodeId, SessionId};
pub use time::SessionTime;
