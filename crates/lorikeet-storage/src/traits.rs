//! Asset storage abstraction
//!
//! This module defines the AssetStore trait the ingestion pipeline writes
//! through, plus the staging handle that tracks one in-flight upload.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lorikeet_core::{ContentHash, SizeClass};
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Publish failed: {0}")]
    PublishFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid file name: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Files written for one upload that are not yet visible in the asset
/// directory.
#[derive(Debug)]
pub struct StagingArea {
    hash: ContentHash,
    dir: PathBuf,
    files: Vec<String>,
}

impl StagingArea {
    pub(crate) fn new(hash: ContentHash, dir: PathBuf) -> Self {
        Self {
            hash,
            dir,
            files: Vec::new(),
        }
    }

    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Names of the files staged so far, in write order
    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub(crate) fn record(&mut self, name: String) {
        if !self.files.contains(&name) {
            self.files.push(name);
        }
    }
}

/// Storage abstraction trait
///
/// The upload path is `begin_staging` → `write_staged`* → `publish` (or
/// `discard` on failure). Published files are only ever located by stem.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Directory published files live in
    fn root(&self) -> &Path;

    /// Create a fresh, private staging directory for one upload
    async fn begin_staging(&self, hash: &ContentHash) -> StorageResult<StagingArea>;

    /// Write one file into the staging area. The file is complete on disk
    /// (written, synced, renamed into place) before this returns.
    async fn write_staged(
        &self,
        staging: &mut StagingArea,
        filename: &str,
        data: Vec<u8>,
    ) -> StorageResult<PathBuf>;

    /// Move every staged file into the asset directory. Either all files are
    /// published or none are.
    async fn publish(&self, staging: StagingArea) -> StorageResult<Vec<PathBuf>>;

    /// Throw away a staging area and everything in it
    async fn discard(&self, staging: StagingArea) -> StorageResult<()>;

    /// Find the published file for `hash` and `size`, whatever its extension
    async fn locate(&self, hash: &ContentHash, size: SizeClass) -> StorageResult<Option<PathBuf>>;

    /// Read a published file
    async fn read(&self, path: &Path) -> StorageResult<Vec<u8>>;
}
