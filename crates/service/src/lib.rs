//! Async facade over the chunk store.
//!
//! Adds what the store deliberately leaves out: disk I/O moved off the
//! async runtime via `spawn_blocking`, at most one in-flight merge per
//! upload identifier, and a bound on merge duration.

mod service;

pub use service::{DEFAULT_MERGE_TIMEOUT, UploadService};

pub use chunkport_store::{ChunkStore, StoreError, UploadState};

/// Errors produced by the upload service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("merge already in progress for upload {0}")]
    MergeInProgress(String),

    #[error("merge timed out for upload {0}")]
    MergeTimeout(String),

    #[error("task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
