//! On-disk chunk storage for resumable uploads.
//!
//! One directory per upload identifier, one file per chunk inside it. The
//! filesystem is the only source of truth: no in-memory index is kept, so
//! concurrent processes sharing the storage root observe consistent state.
//!
//! A successful merge concatenates the chunks in sequence order into a
//! temporary file and atomically renames it onto the final artifact path;
//! the chunk directory is deleted only after the rename. A failed or
//! interrupted merge therefore leaves either a clean pre-merge state (chunk
//! directory intact, no artifact) or a clean post-merge state, never a
//! partial artifact.

mod inspect;
mod merge;
mod sequence;
mod store;
mod validation;

pub use inspect::UploadState;
pub use sequence::sequence_index;
pub use store::ChunkStore;
pub use validation::validate_identifier;

/// Maximum accepted chunk size: 5 MiB.
///
/// Clients splitting a file into larger pieces must re-chunk; the limit
/// bounds per-request memory on the upload path.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 5 * 1024 * 1024;

/// Errors produced by the store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("missing parameter: {0}")]
    MissingParameter(&'static str),

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("chunk of {size} bytes exceeds the {limit} byte limit")]
    ChunkTooLarge { size: usize, limit: usize },

    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] std::io::Error),

    #[error("chunk directory not found for upload {0}")]
    ChunkDirectoryNotFound(String),

    #[error("malformed chunk identifier: {0}")]
    MalformedChunkIdentifier(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
