//! Lorikeet Core Library
//!
//! This crate provides the domain models, error taxonomy, configuration and
//! constants shared by every Lorikeet component.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{Config, IngestConfig, OutputFormat};
pub use error::{
    ErrorMetadata, IngestError, LogLevel, PersistenceError, ProcessingError, TransportError,
    ValidationError,
};
pub use models::{
    Asset, AssetRecord, AssetSummary, ContentHash, ImageMimeType, ServedImage, SizeClass, Tag,
    TagRecord, TransportStatus, UploadDescriptor,
};
