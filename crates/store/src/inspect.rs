use crate::validation::validate_identifier;
use crate::{ChunkStore, StoreError};

/// What the client still needs to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadState {
    /// `true` if the final artifact already exists.
    pub complete: bool,
    /// Chunk identifiers already on disk (empty when `complete`).
    pub present_chunk_ids: Vec<String>,
}

impl ChunkStore {
    /// Reports the state of an upload: complete, partial, or absent.
    ///
    /// Pure read — never creates the chunk directory, never writes. Once
    /// the final artifact exists the chunk directory is irrelevant and is
    /// not consulted.
    pub fn inspect(&self, upload_id: &str, filename: &str) -> Result<UploadState, StoreError> {
        if upload_id.is_empty() {
            return Err(StoreError::MissingParameter("hash"));
        }
        if filename.is_empty() {
            return Err(StoreError::MissingParameter("filename"));
        }
        validate_identifier(upload_id)?;
        validate_identifier(filename)?;

        if self.artifact_path(upload_id, filename).is_file() {
            return Ok(UploadState {
                complete: true,
                present_chunk_ids: Vec::new(),
            });
        }

        Ok(UploadState {
            complete: false,
            present_chunk_ids: self.list_chunks(upload_id)?,
        })
    }
}
