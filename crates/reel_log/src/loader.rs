//! Chunk loader.
//!
//! A recording is split into ordered chunks. They are fetched strictly in
//! order and handed to the caller one at a time. A missing chunk after the
//! first marks the natural end of a truncated log; a missing first chunk or
//! any other failing status is a hard error.

use crate::encoding::DecodeError;
use async_trait::async_trait;
use bytes::Bytes;
use indexmap::IndexMap;
use reel_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

/// HTTP-style status for a missing chunk
pub const STATUS_NOT_FOUND: u16 = 404;

/// Response for a single chunk request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkResponse {
    /// HTTP-style status code
    pub status: u16,
    /// Chunk bytes (empty for failing statuses)
    pub body: Bytes,
}

impl ChunkResponse {
    /// Successful response
    #[must_use]
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// Response with a status and no body
    #[must_use]
    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Bytes::new(),
        }
    }
}

/// Loader errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// Nothing to load
    #[error("No chunk locations provided")]
    NoLocations,
    /// The first chunk failed; the log has no start
    #[error("No start chunk at {location}: status {status}")]
    MissingStart {
        /// Location of the first chunk
        location: String,
        /// Returned status
        status: u16,
    },
    /// A later chunk failed with a status other than not-found
    #[error("Bad chunk status at {location}: {status}")]
    BadStatus {
        /// Location of the failing chunk
        location: String,
        /// Returned status
        status: u16,
    },
    /// Transport failure
    #[error("IO error at {location}: {reason}")]
    Io {
        /// Location being fetched
        location: String,
        /// Underlying failure
        reason: String,
    },
    /// A chunk could not be decoded
    #[error("Chunk {location} could not be decoded: {source}")]
    Decode {
        /// Location of the chunk
        location: String,
        /// Decoder failure
        source: DecodeError,
    },
}

impl From<LoadError> for CoreError {
    fn from(err: LoadError) -> Self {
        let location = match &err {
            LoadError::NoLocations => String::new(),
            LoadError::MissingStart { location, .. }
            | LoadError::BadStatus { location, .. }
            | LoadError::Io { location, .. }
            | LoadError::Decode { location, .. } => location.clone(),
        };
        CoreError::Fetch {
            location,
            reason: err.to_string(),
        }
    }
}

/// Outcome of a completed load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadOutcome {
    /// Chunks delivered to the caller
    pub chunks: usize,
    /// Whether the log ended early at a missing chunk
    pub truncated: bool,
}

/// Something that can fetch recorded chunks
#[async_trait]
pub trait ChunkSource {
    /// Fetch one chunk
    ///
    /// # Errors
    ///
    /// Returns error on transport failure. Failing statuses are reported in
    /// the response, not as errors.
    async fn fetch(&self, location: &str) -> Result<ChunkResponse, LoadError>;
}

/// Fetch every chunk in order and pass each body to `on_chunk`
///
/// # Errors
///
/// Returns error if the list is empty, the first chunk is missing, any chunk
/// fails with a status other than not-found, or `on_chunk` fails
pub async fn load_chunks<S, F>(
    source: &S,
    locations: &[String],
    mut on_chunk: F,
) -> Result<LoadOutcome, LoadError>
where
    S: ChunkSource + ?Sized,
    F: FnMut(&str, Bytes) -> Result<(), LoadError>,
{
    if locations.is_empty() {
        return Err(LoadError::NoLocations);
    }

    let mut outcome = LoadOutcome::default();
    for (i, location) in locations.iter().enumerate() {
        let response = source.fetch(location).await?;
        let first = i == 0;
        if response.status == STATUS_NOT_FOUND && !first {
            info!(location = %location, chunks = outcome.chunks, "log ends at missing chunk");
            outcome.truncated = true;
            break;
        }
        if response.status >= 400 {
            return Err(if first {
                LoadError::MissingStart {
                    location: location.clone(),
                    status: response.status,
                }
            } else {
                LoadError::BadStatus {
                    location: location.clone(),
                    status: response.status,
                }
            });
        }
        debug!(location = %location, bytes = response.body.len(), "chunk loaded");
        on_chunk(location, response.body)?;
        outcome.chunks += 1;
    }
    Ok(outcome)
}

/// Chunks read from a directory on disk
///
/// A missing file answers not-found, like a missing object in remote storage.
#[derive(Debug, Clone)]
pub struct FileSource {
    base: PathBuf,
}

impl FileSource {
    /// Resolve locations relative to `base`
    #[must_use]
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

#[async_trait]
impl ChunkSource for FileSource {
    async fn fetch(&self, location: &str) -> Result<ChunkResponse, LoadError> {
        match tokio::fs::read(self.base.join(location)).await {
            Ok(bytes) => Ok(ChunkResponse::ok(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(ChunkResponse::status(STATUS_NOT_FOUND))
            }
            Err(e) => Err(LoadError::Io {
                location: location.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

/// In-memory chunks keyed by location
///
/// Unknown locations answer not-found.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    chunks: IndexMap<String, ChunkResponse>,
}

impl MemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` at `location`
    #[must_use]
    pub fn with_chunk(mut self, location: &str, body: impl Into<Bytes>) -> Self {
        self.chunks
            .insert(location.to_string(), ChunkResponse::ok(body));
        self
    }

    /// Answer `status` at `location`
    #[must_use]
    pub fn with_status(mut self, location: &str, status: u16) -> Self {
        self.chunks
            .insert(location.to_string(), ChunkResponse::status(status));
        self
    }
}

#[async_trait]
impl ChunkSource for MemorySource {
    async fn fetch(&self, location: &str) -> Result<ChunkResponse, LoadError> {
        Ok(self
            .chunks
            .get(location)
            .cloned()
            .unwrap_or_else(|| ChunkResponse::status(STATUS_NOT_FOUND)))
    }
}
