use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use tempfile::NamedTempFile;

use crate::sequence::sequence_index;
use crate::validation::validate_identifier;
use crate::{ChunkStore, StoreError};

impl ChunkStore {
    /// Reassembles all chunks of an upload into the final artifact.
    ///
    /// Chunks are ordered by the numeric sequence index embedded in their
    /// identifiers and stream-concatenated into a temporary file next to
    /// the artifact path. Only after every chunk is written and fsynced is
    /// the temporary file atomically renamed onto the artifact path, and
    /// only after the rename is the chunk directory deleted. An interrupted
    /// merge therefore leaves the chunk directory intact and no visible
    /// artifact, and retrying with the same inputs is safe.
    ///
    /// Any chunk identifier without a parsable sequence index fails the
    /// whole merge with [`StoreError::MalformedChunkIdentifier`].
    ///
    /// The caller is responsible for ensuring at most one merge runs per
    /// upload identifier at a time.
    pub fn merge(&self, upload_id: &str, filename: &str) -> Result<PathBuf, StoreError> {
        if upload_id.is_empty() {
            return Err(StoreError::MissingParameter("hash"));
        }
        if filename.is_empty() {
            return Err(StoreError::MissingParameter("filename"));
        }
        validate_identifier(upload_id)?;
        validate_identifier(filename)?;

        if !self.chunk_directory_exists(upload_id) {
            // Covers both "nothing was ever uploaded" and "already merged";
            // the caller disambiguates via inspect.
            return Err(StoreError::ChunkDirectoryNotFound(upload_id.to_string()));
        }

        let mut ordered: Vec<(u64, String)> = self
            .list_chunks(upload_id)?
            .into_iter()
            .map(|chunk_id| sequence_index(&chunk_id).map(|index| (index, chunk_id)))
            .collect::<Result<_, _>>()?;
        ordered.sort();

        let artifact_dir = self.artifact_dir(upload_id);
        std::fs::create_dir_all(&artifact_dir).map_err(StoreError::StorageUnavailable)?;

        // Two-phase commit: concatenate into a temp file in the artifact's
        // directory so the final rename stays on one filesystem.
        let chunk_dir = self.chunk_dir(upload_id);
        let mut tmp = NamedTempFile::new_in(&artifact_dir)?;
        {
            let mut out = BufWriter::new(tmp.as_file_mut());
            for (_, chunk_id) in &ordered {
                let mut chunk = File::open(chunk_dir.join(chunk_id))?;
                io::copy(&mut chunk, &mut out)?;
            }
            out.flush()?;
        }
        tmp.as_file().sync_all()?;

        let final_path = self.artifact_path(upload_id, filename);
        tmp.persist(&final_path).map_err(|e| e.error)?;

        // The artifact is durable; the chunk directory is now retired.
        self.remove_chunk_directory(upload_id)?;

        tracing::info!(
            upload_id,
            chunks = ordered.len(),
            path = %final_path.display(),
            "merge complete"
        );
        Ok(final_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn upload(store: &ChunkStore, upload_id: &str, chunk_id: &str, bytes: &[u8]) {
        let path = store.resolve_chunk_destination(upload_id, chunk_id).unwrap();
        store.write_chunk(&path, bytes).unwrap();
    }

    #[test]
    fn merges_out_of_order_chunks_numerically() {
        let tmp = TempDir::new().unwrap();
        let store = ChunkStore::new(tmp.path());

        upload(&store, "abc123", "part-2", b"CC");
        upload(&store, "abc123", "part-0", b"AA");
        upload(&store, "abc123", "part-1", b"BB");

        let path = store.merge("abc123", "out.bin").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"AABBCC");
    }

    #[test]
    fn numeric_order_beats_lexicographic() {
        let tmp = TempDir::new().unwrap();
        let store = ChunkStore::new(tmp.path());

        // Lexicographically "part-10" < "part-9"; numerically it is not.
        upload(&store, "abc123", "part-10", b"K");
        upload(&store, "abc123", "part-9", b"J");

        let path = store.merge("abc123", "out.bin").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"JK");
    }

    #[test]
    fn merge_removes_chunk_directory() {
        let tmp = TempDir::new().unwrap();
        let store = ChunkStore::new(tmp.path());

        upload(&store, "abc123", "part-0", b"AA");
        store.merge("abc123", "out.bin").unwrap();
        assert!(!store.chunk_directory_exists("abc123"));
    }

    #[test]
    fn merge_without_chunks_fails() {
        let tmp = TempDir::new().unwrap();
        let store = ChunkStore::new(tmp.path());

        assert!(matches!(
            store.merge("never-uploaded", "out.bin"),
            Err(StoreError::ChunkDirectoryNotFound(_))
        ));
    }

    #[test]
    fn second_merge_fails_and_leaves_artifact_intact() {
        let tmp = TempDir::new().unwrap();
        let store = ChunkStore::new(tmp.path());

        upload(&store, "abc123", "part-0", b"AA");
        let path = store.merge("abc123", "out.bin").unwrap();

        assert!(matches!(
            store.merge("abc123", "out.bin"),
            Err(StoreError::ChunkDirectoryNotFound(_))
        ));
        assert_eq!(std::fs::read(&path).unwrap(), b"AA");
        assert!(store.inspect("abc123", "out.bin").unwrap().complete);
    }

    #[test]
    fn malformed_chunk_identifier_fails_closed() {
        let tmp = TempDir::new().unwrap();
        let store = ChunkStore::new(tmp.path());

        upload(&store, "abc123", "part-0", b"AA");
        upload(&store, "abc123", "orphan", b"BB");

        let err = store.merge("abc123", "out.bin").unwrap_err();
        assert!(matches!(err, StoreError::MalformedChunkIdentifier(id) if id == "orphan"));

        // Nothing was consumed or produced.
        assert!(store.chunk_directory_exists("abc123"));
        assert!(!store.inspect("abc123", "out.bin").unwrap().complete);
    }

    #[test]
    fn failed_merge_leaves_clean_pre_merge_state() {
        let tmp = TempDir::new().unwrap();
        let store = ChunkStore::new(tmp.path());

        upload(&store, "abc123", "part-0", b"AA");
        // A directory where a chunk file should be makes the read fail
        // mid-stream.
        std::fs::create_dir(tmp.path().join("chunks/abc123/part-1")).unwrap();

        assert!(store.merge("abc123", "out.bin").is_err());

        // Chunk directory intact, no visible artifact, no leftover temp file.
        let state = store.inspect("abc123", "out.bin").unwrap();
        assert!(!state.complete);
        assert!(state.present_chunk_ids.contains(&"part-0".to_string()));
        let leftovers: Vec<_> = std::fs::read_dir(tmp.path().join("complete/abc123"))
            .map(|entries| entries.filter_map(|e| e.ok()).collect())
            .unwrap_or_default();
        assert!(leftovers.is_empty(), "leftover files: {leftovers:?}");
    }

    #[test]
    fn merge_with_empty_parameters_is_missing() {
        let tmp = TempDir::new().unwrap();
        let store = ChunkStore::new(tmp.path());

        assert!(matches!(
            store.merge("", "out.bin"),
            Err(StoreError::MissingParameter("hash"))
        ));
        assert!(matches!(
            store.merge("abc123", ""),
            Err(StoreError::MissingParameter("filename"))
        ));
    }

    #[test]
    fn spec_scenario_aabb() {
        let tmp = TempDir::new().unwrap();
        let store = ChunkStore::new(tmp.path());

        upload(&store, "x1", "c-0", b"AA");
        upload(&store, "x1", "c-1", b"BB");

        let mut state = store.inspect("x1", "f.bin").unwrap();
        state.present_chunk_ids.sort();
        assert!(!state.complete);
        assert_eq!(state.present_chunk_ids, vec!["c-0", "c-1"]);

        let path = store.merge("x1", "f.bin").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"AABB");

        let state = store.inspect("x1", "f.bin").unwrap();
        assert!(state.complete);
        assert!(state.present_chunk_ids.is_empty());
    }
}
