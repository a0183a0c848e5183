//! Test helpers: an AssetService over a temporary asset directory and an
//! in-memory repository.
//!
//! Run from workspace root: `cargo test -p lorikeet-services`.

#![allow(dead_code)]

pub mod fixtures;

use std::path::PathBuf;
use std::sync::Arc;

use lorikeet_core::{IngestConfig, UploadDescriptor};
use lorikeet_services::{
    AssetRepository, AssetService, AssetStore, LocalAssetStore, MemoryAssetRepository,
};
use tempfile::TempDir;

pub struct TestApp {
    pub service: AssetService,
    pub repository: MemoryAssetRepository,
    pub asset_dir: PathBuf,
    uploads: TempDir,
    _assets: TempDir,
}

impl TestApp {
    /// Write `data` to a fresh temporary upload file
    pub fn upload_file(&self, name: &str, data: &[u8]) -> UploadDescriptor {
        let path = self.uploads.path().join(name);
        std::fs::write(&path, data).expect("Failed to write upload file");
        let mut upload = UploadDescriptor::from_path(path);
        upload.declared_size = Some(data.len() as u64);
        upload
    }

    /// Names of the files published in the asset directory
    pub fn published_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.asset_dir)
            .expect("Failed to read asset directory")
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Entries left in the staging directory
    pub fn staged_entries(&self) -> usize {
        std::fs::read_dir(self.asset_dir.join(".staging"))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

pub fn test_config(asset_dir: PathBuf) -> IngestConfig {
    IngestConfig {
        max_width: 200,
        max_height: 200,
        thumbnail_max_width: 50,
        thumbnail_max_height: 50,
        asset_directory: asset_dir,
        ..IngestConfig::default()
    }
}

pub async fn setup_test_app() -> TestApp {
    setup_with_repository(MemoryAssetRepository::new(), |repo| {
        Arc::new(repo) as Arc<dyn AssetRepository>
    })
    .await
}

/// Build a TestApp whose service talks to `wrap(repository)`, so tests can
/// interpose on repository calls while still inspecting the in-memory state.
pub async fn setup_with_repository<F>(repository: MemoryAssetRepository, wrap: F) -> TestApp
where
    F: FnOnce(MemoryAssetRepository) -> Arc<dyn AssetRepository>,
{
    let assets = TempDir::new().expect("Failed to create asset directory");
    let uploads = TempDir::new().expect("Failed to create upload directory");
    let asset_dir = assets.path().to_path_buf();

    let store = LocalAssetStore::new(&asset_dir)
        .await
        .expect("Failed to create local store");
    let service = AssetService::new(
        test_config(asset_dir.clone()),
        wrap(repository.clone()),
        Arc::new(store),
    );

    TestApp {
        service,
        repository,
        asset_dir,
        uploads,
        _assets: assets,
    }
}

/// Build a TestApp around a custom store implementation
pub async fn setup_with_store<F>(wrap: F) -> TestApp
where
    F: FnOnce(LocalAssetStore) -> Arc<dyn AssetStore>,
{
    let assets = TempDir::new().expect("Failed to create asset directory");
    let uploads = TempDir::new().expect("Failed to create upload directory");
    let asset_dir = assets.path().to_path_buf();
    let repository = MemoryAssetRepository::new();

    let store = LocalAssetStore::new(&asset_dir)
        .await
        .expect("Failed to create local store");
    let service = AssetService::new(
        test_config(asset_dir.clone()),
        Arc::new(repository.clone()),
        wrap(store),
    );

    TestApp {
        service,
        repository,
        asset_dir,
        uploads,
        _assets: assets,
    }
}
