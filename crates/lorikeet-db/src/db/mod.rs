//! Database repositories for data access layer
//!
//! `asset` holds the repository trait and its implementations; `transaction`
//! the guard used for multi-statement writes.
//
// Asset repositories
pub mod asset;
//
// Transaction utilities
pub mod transaction;
//
pub use asset::{AssetRepository, MemoryAssetRepository, PgAssetRepository};
