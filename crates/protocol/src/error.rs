use serde::{Deserialize, Serialize};

/// Failure taxonomy exposed on the wire.
///
/// Retryability is part of the contract: `storageUnavailable` is retryable
/// after operator intervention, `mergeInProgress` after backoff; the caller
/// errors (`missingParameter`, `invalidIdentifier`, `chunkTooLarge`,
/// `malformedChunkIdentifier`) are not retryable as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    MissingParameter,
    InvalidIdentifier,
    ChunkTooLarge,
    StorageUnavailable,
    ChunkDirectoryNotFound,
    MergeInProgress,
    MergeTimeout,
    MalformedChunkIdentifier,
    Io,
}

/// Structured error envelope returned by every failing operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: ErrorKind,
    pub message: String,
}
