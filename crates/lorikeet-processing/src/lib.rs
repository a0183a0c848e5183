//! Lorikeet Processing Library
//!
//! The ingestion pipeline stages: upload validation, dimension scaling, image
//! derivation (decode, resize, re-encode), tag normalization and record
//! assembly. Orchestration lives in `lorikeet-services`.

pub mod codec;
pub mod deriver;
pub mod records;
pub mod scaling;
pub mod tags;
pub mod validator;

// Re-export commonly used types
pub use codec::{ImageCodec, RasterCodec};
pub use deriver::{DerivedFiles, ImageDeriver};
pub use records::{AssetRecordBuilder, UploadMetadata};
pub use scaling::ScalingPolicy;
pub use tags::normalize_tags;
pub use validator::{UploadValidator, ValidatedUpload};
