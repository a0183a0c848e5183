//! Lorikeet Services Layer
//!
//! This crate is the **service layer**: `AssetService` coordinates validation,
//! derivation, persistence and publishing for uploads, and answers retrieval
//! queries. It re-exports the pieces callers need so front ends (the CLI, an
//! HTTP layer) depend on a single facade.

pub mod services;

pub use lorikeet_db::{AssetRepository, MemoryAssetRepository, PgAssetRepository};
pub use lorikeet_processing::{
    normalize_tags, AssetRecordBuilder, ImageCodec, RasterCodec, ScalingPolicy, UploadMetadata,
};
pub use lorikeet_storage::{AssetStore, LocalAssetStore, StorageError, StorageResult};
pub use services::AssetService;
