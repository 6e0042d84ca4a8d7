use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::Mutex as AsyncMutex;

use chunkport_store::{ChunkStore, UploadState};

use crate::ServiceError;

/// Default bound on merge duration: 5 minutes.
///
/// A stuck filesystem surfaces [`ServiceError::MergeTimeout`] instead of
/// hanging the caller; the merge itself keeps running to completion or
/// explicit failure so no half-merged state is abandoned.
pub const DEFAULT_MERGE_TIMEOUT: Duration = Duration::from_secs(300);

/// Async upload service exposing the three operations: verify, upload
/// chunk, merge.
///
/// Every disk operation runs under `spawn_blocking` so a slow disk never
/// stalls the request path. Merges are serialized per upload identifier:
/// a merge request arriving while one is in flight for the same identifier
/// fails fast with [`ServiceError::MergeInProgress`].
pub struct UploadService {
    store: Arc<ChunkStore>,
    /// One lock per upload identifier with a merge currently in flight.
    /// Each entry is pruned once its merge finishes and no other request
    /// holds it, whatever the outcome, so merge attempts for arbitrary
    /// client-supplied identifiers cannot grow the map without bound.
    merge_locks: Arc<StdMutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
    merge_timeout: Duration,
}

impl UploadService {
    /// Creates a service over `store` with the default merge timeout.
    pub fn new(store: ChunkStore) -> Self {
        Self {
            store: Arc::new(store),
            merge_locks: Arc::new(StdMutex::new(HashMap::new())),
            merge_timeout: DEFAULT_MERGE_TIMEOUT,
        }
    }

    /// Overrides the merge duration bound.
    pub fn with_merge_timeout(mut self, merge_timeout: Duration) -> Self {
        self.merge_timeout = merge_timeout;
        self
    }

    /// Returns the underlying chunk store.
    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    /// Reports whether the upload is complete and which chunks are present.
    pub async fn verify(
        &self,
        upload_id: &str,
        filename: &str,
    ) -> Result<UploadState, ServiceError> {
        let store = self.store.clone();
        let upload_id = upload_id.to_string();
        let filename = filename.to_string();
        let state = tokio::task::spawn_blocking(move || store.inspect(&upload_id, &filename))
            .await??;
        Ok(state)
    }

    /// Stores one chunk, overwriting any prior chunk with the same
    /// identifier, and returns the path it was written to.
    pub async fn upload_chunk(
        &self,
        upload_id: &str,
        chunk_id: &str,
        bytes: Vec<u8>,
    ) -> Result<PathBuf, ServiceError> {
        let store = self.store.clone();
        let upload_id = upload_id.to_string();
        let chunk_id = chunk_id.to_string();
        let path = tokio::task::spawn_blocking(move || {
            let path = store.resolve_chunk_destination(&upload_id, &chunk_id)?;
            store.write_chunk(&path, &bytes)?;
            Ok::<_, chunkport_store::StoreError>(path)
        })
        .await??;
        Ok(path)
    }

    /// Merges all chunks of an upload into the final artifact.
    ///
    /// At most one merge runs per upload identifier; concurrent requests
    /// fail fast with [`ServiceError::MergeInProgress`]. If the merge
    /// outlives the configured timeout the caller gets
    /// [`ServiceError::MergeTimeout`] while the merge task runs on to
    /// completion with the per-identifier lock still held, so a retry can
    /// never interleave with it.
    pub async fn merge(&self, upload_id: &str, filename: &str) -> Result<PathBuf, ServiceError> {
        let lock = {
            let mut locks = self.merge_locks.lock().unwrap();
            locks.entry(upload_id.to_string()).or_default().clone()
        };
        let Ok(guard) = lock.try_lock_owned() else {
            tracing::warn!(upload_id, "merge rejected, another merge in flight");
            return Err(ServiceError::MergeInProgress(upload_id.to_string()));
        };

        let store = self.store.clone();
        let locks = self.merge_locks.clone();
        let id = upload_id.to_string();
        let name = filename.to_string();
        let merge_task = tokio::spawn(async move {
            let merge_id = id.clone();
            let result = tokio::task::spawn_blocking(move || store.merge(&merge_id, &name)).await;
            // Release the per-identifier lock only once the merge has
            // actually finished, even if the caller stopped waiting.
            drop(guard);
            // Prune the entry unless another request fetched it in the
            // meantime (the map mutex serializes fetch and prune, so a
            // strong count of one means only the map references it).
            let mut locks = locks.lock().unwrap();
            if let Some(entry) = locks.get(&id)
                && Arc::strong_count(entry) == 1
            {
                locks.remove(&id);
            }
            result
        });

        match tokio::time::timeout(self.merge_timeout, merge_task).await {
            Err(_) => {
                tracing::error!(upload_id, timeout = ?self.merge_timeout, "merge timed out");
                Err(ServiceError::MergeTimeout(upload_id.to_string()))
            }
            Ok(joined) => Ok(joined???),
        }
    }
}
