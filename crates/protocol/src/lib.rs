//! Wire types for the chunkport chunked-upload API.
//!
//! All request/response bodies are JSON with camelCase field names. The
//! identifier field names on the wire (`hash`, `chunkHash`) are kept for
//! compatibility with existing upload clients; internally they are the
//! upload identifier and chunk identifier.

pub mod error;
pub mod messages;

pub use error::{ErrorKind, ErrorResponse};
pub use messages::{
    MergeRequest, MergeResponse, UploadChunkResponse, VerifyRequest, VerifyResponse,
};

/// Header carrying the upload identifier on `POST /api/upload`.
pub const HEADER_FILE_HASH: &str = "x-file-hash";

/// Header carrying the chunk identifier on `POST /api/upload`.
pub const HEADER_CHUNK_HASH: &str = "x-chunk-hash";
