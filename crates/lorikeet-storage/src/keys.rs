//! Shared filename generation for stored assets.

use lorikeet_core::{ContentHash, SizeClass};

use crate::traits::{StorageError, StorageResult};

/// Filename stem for one size class of an asset: `{hash}` or `{hash}_thumb`.
pub fn asset_stem(hash: &ContentHash, size: SizeClass) -> String {
    format!("{}{}", hash, size.suffix())
}

/// Full filename, e.g. `{hash}_thumb.webp`.
pub fn asset_filename(hash: &ContentHash, size: SizeClass, extension: &str) -> String {
    format!("{}.{}", asset_stem(hash, size), extension)
}

/// Reject anything that is not a plain file name inside the store.
pub fn validate_filename(name: &str) -> StorageResult<()> {
    if name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..")
        || name.starts_with('.')
    {
        return Err(StorageError::InvalidKey(name.to_string()));
    }
    Ok(())
}
