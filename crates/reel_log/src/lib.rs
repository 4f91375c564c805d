//! REEL Message Log
//!
//! Recorded mutation messages, the time-indexed cursor used to walk them,
//! and the loader/codec pair that turns stored chunks into a message stream.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cursor;
pub mod encoding;
pub mod loader;
pub mod message;

pub use cursor::{Timed, TimedEventCursor};
pub use encoding::{decode_chunk, encode_messages, DecodeError};
pub use loader::{load_chunks, ChunkResponse, ChunkSource, FileSource, LoadError, LoadOutcome, MemorySource};
pub use message::{
    CreateDocument, CreateElementNode, CreateIFrameDocument, CreateTextNode, CssDeleteRule,
    CssInsertRule, Message, MoveNode, RemoveNode, RemoveNodeAttribute, SetInputChecked,
    SetInputValue, SetNodeAttribute, SetNodeData, SetNodeScroll,
};
