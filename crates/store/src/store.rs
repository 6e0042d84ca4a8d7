use std::fs;
use std::path::{Path, PathBuf};

use crate::validation::validate_identifier;
use crate::{DEFAULT_MAX_CHUNK_SIZE, StoreError};

/// Maps (upload identifier, chunk identifier) pairs to filesystem locations.
///
/// Layout under the storage root:
///
/// ```text
/// <root>/chunks/<upload_id>/<chunk_id>     not-yet-merged chunk files
/// <root>/complete/<upload_id>/<filename>   final artifact
/// ```
///
/// The store keeps no in-memory state; every query hits the filesystem, so
/// multiple instances sharing a root observe consistent state.
#[derive(Debug, Clone)]
pub struct ChunkStore {
    root: PathBuf,
    max_chunk_size: usize,
}

impl ChunkStore {
    /// Creates a store rooted at `root` with the default 5 MiB chunk limit.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
        }
    }

    /// Overrides the maximum accepted chunk size.
    pub fn with_max_chunk_size(mut self, max_chunk_size: usize) -> Self {
        self.max_chunk_size = max_chunk_size;
        self
    }

    /// Returns the storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the configured chunk size limit in bytes.
    pub fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    /// Creates the `chunks/` and `complete/` subtrees under the root.
    ///
    /// Called once at startup; [`resolve_chunk_destination`] also creates
    /// directories on demand, so this only front-loads permission errors.
    ///
    /// [`resolve_chunk_destination`]: ChunkStore::resolve_chunk_destination
    pub fn bootstrap(&self) -> Result<(), StoreError> {
        fs::create_dir_all(self.root.join("chunks")).map_err(StoreError::StorageUnavailable)?;
        fs::create_dir_all(self.root.join("complete")).map_err(StoreError::StorageUnavailable)?;
        Ok(())
    }

    /// Directory holding the not-yet-merged chunks of one upload.
    pub(crate) fn chunk_dir(&self, upload_id: &str) -> PathBuf {
        self.root.join("chunks").join(upload_id)
    }

    /// Directory the final artifact of one upload lands in.
    pub(crate) fn artifact_dir(&self, upload_id: &str) -> PathBuf {
        self.root.join("complete").join(upload_id)
    }

    /// Path of the final artifact for an upload, derived from the upload
    /// identifier and the client-supplied filename.
    pub fn artifact_path(&self, upload_id: &str, filename: &str) -> PathBuf {
        self.artifact_dir(upload_id).join(filename)
    }

    /// Resolves the path a chunk should be written to, creating the chunk
    /// directory if absent.
    ///
    /// Safe to call concurrently: an already existing directory is success.
    /// Fails with [`StoreError::InvalidIdentifier`] if either identifier is
    /// missing or unsafe, and [`StoreError::StorageUnavailable`] if the
    /// directory cannot be created.
    pub fn resolve_chunk_destination(
        &self,
        upload_id: &str,
        chunk_id: &str,
    ) -> Result<PathBuf, StoreError> {
        validate_identifier(upload_id)?;
        validate_identifier(chunk_id)?;

        let dir = self.chunk_dir(upload_id);
        fs::create_dir_all(&dir).map_err(StoreError::StorageUnavailable)?;
        Ok(dir.join(chunk_id))
    }

    /// Persists chunk bytes at `path`, overwriting any prior content.
    ///
    /// The size limit is enforced before anything touches disk, so an
    /// oversized payload leaves no partial file behind.
    pub fn write_chunk(&self, path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        if bytes.len() > self.max_chunk_size {
            return Err(StoreError::ChunkTooLarge {
                size: bytes.len(),
                limit: self.max_chunk_size,
            });
        }
        fs::write(path, bytes)?;
        tracing::debug!(path = %path.display(), size = bytes.len(), "chunk written");
        Ok(())
    }

    /// Lists the chunk identifiers currently on disk for an upload.
    ///
    /// A missing chunk directory is an empty list, not an error.
    pub fn list_chunks(&self, upload_id: &str) -> Result<Vec<String>, StoreError> {
        validate_identifier(upload_id)?;

        let dir = self.chunk_dir(upload_id);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut chunk_ids = Vec::new();
        for entry in entries {
            let entry = entry?;
            chunk_ids.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(chunk_ids)
    }

    /// Returns `true` if the chunk directory for `upload_id` exists.
    pub fn chunk_directory_exists(&self, upload_id: &str) -> bool {
        self.chunk_dir(upload_id).is_dir()
    }

    /// Recursively deletes the chunk directory for an upload.
    ///
    /// Idempotent: an already absent directory is success.
    pub fn remove_chunk_directory(&self, upload_id: &str) -> Result<(), StoreError> {
        validate_identifier(upload_id)?;

        match fs::remove_dir_all(self.chunk_dir(upload_id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
