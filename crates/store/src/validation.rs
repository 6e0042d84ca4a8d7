use std::path::{Component, Path};

use crate::StoreError;

/// Validates that an identifier is safe to use as a single path segment.
///
/// Identifiers (upload identifiers, chunk identifiers, artifact filenames)
/// become file or directory names under the storage root, so they must be
/// exactly one normal path component. Rejects:
/// - empty strings
/// - absolute paths and Windows prefixes (`/x`, `C:\x`)
/// - parent/current directory components (`..`, `.`)
/// - anything containing a path separator
pub fn validate_identifier(id: &str) -> Result<(), StoreError> {
    if id.is_empty() {
        return Err(StoreError::InvalidIdentifier("empty identifier".into()));
    }

    let path = Path::new(id);
    let mut components = path.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(StoreError::InvalidIdentifier(format!(
            "identifier must be a single path segment: {id}"
        ))),
    }
}
