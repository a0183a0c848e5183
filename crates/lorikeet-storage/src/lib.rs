//! Lorikeet Storage Library
//!
//! File storage for derived images. Every stored file lives directly in the
//! asset directory and is named after the asset's content hash:
//!
//! - **Display image**: `{hash}.{ext}`
//! - **Thumbnail**: `{hash}_thumb.{ext}`
//!
//! Files are first written into a per-upload staging directory under
//! `{asset_dir}/.staging/` and only moved into the asset directory once the
//! upload has been recorded. Filename generation is centralized in the `keys`
//! module.

pub mod keys;
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use local::LocalAssetStore;
pub use traits::{AssetStore, StagingArea, StorageError, StorageResult};
