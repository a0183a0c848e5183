//! Lorikeet Database Library
//!
//! Repositories for image assets and their tags, the Postgres connection
//! setup, and an in-memory repository for tests and database-less runs.

pub mod db;
pub mod setup;

pub use db::{AssetRepository, MemoryAssetRepository, PgAssetRepository};
pub use setup::{run_migrations, setup_database};
