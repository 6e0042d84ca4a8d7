use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Asks which chunks of an upload are still missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    /// Upload identifier (conventionally a whole-file content hash).
    pub hash: String,
    /// Name the final artifact should be stored under.
    pub filename: String,
}

/// Requests reassembly of a complete set of chunks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    pub hash: String,
    pub filename: String,
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

/// Upload state as seen on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    /// `true` if the final artifact already exists; the client must not
    /// re-upload anything.
    pub complete: bool,
    /// Chunk identifiers already present (empty when `complete`).
    #[serde(default)]
    pub present_chunk_ids: Vec<String>,
}

/// Acknowledges a stored chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadChunkResponse {
    /// Path the chunk was written to.
    pub path: String,
}

/// Reports a completed merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeResponse {
    /// Path of the final artifact.
    pub path: String,
}
