use crate::StoreError;

/// Extracts the numeric sequence index from a chunk identifier.
///
/// The convention is `<prefix>-<index>`: everything after the first `-` must
/// parse as an unsigned integer. Identifiers that do not follow the
/// convention fail closed with [`StoreError::MalformedChunkIdentifier`]
/// rather than sorting arbitrarily.
pub fn sequence_index(chunk_id: &str) -> Result<u64, StoreError> {
    chunk_id
        .split_once('-')
        .and_then(|(_, index)| index.parse::<u64>().ok())
        .ok_or_else(|| StoreError::MalformedChunkIdentifier(chunk_id.to_string()))
}
