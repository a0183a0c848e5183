use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use lorikeet_core::constants::STAGING_DIR_NAME;
use lorikeet_core::{ContentHash, SizeClass};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::keys::{asset_stem, validate_filename};
use crate::traits::{AssetStore, StagingArea, StorageError, StorageResult};

/// Local filesystem asset store
#[derive(Debug, Clone)]
pub struct LocalAssetStore {
    base_path: PathBuf,
}

impl LocalAssetStore {
    /// Create a new LocalAssetStore, creating the asset directory if needed
    ///
    /// # Arguments
    /// * `base_path` - Directory published images are stored in (e.g., "/var/lib/lorikeet")
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create asset directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalAssetStore { base_path })
    }

    fn staging_root(&self) -> PathBuf {
        self.base_path.join(STAGING_DIR_NAME)
    }

    /// Write `data` to `path` via a temporary sibling so readers never see a
    /// partially written file.
    async fn write_atomic(path: &Path, data: &[u8]) -> StorageResult<()> {
        let tmp_path = path.with_extension("tmp");

        let mut file = fs::File::create(&tmp_path).await.map_err(|e| {
            StorageError::WriteFailed(format!(
                "Failed to create file {}: {}",
                tmp_path.display(),
                e
            ))
        })?;

        file.write_all(data).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to write file {}: {}", tmp_path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to sync file {}: {}", tmp_path.display(), e))
        })?;
        drop(file);

        if let Err(e) = fs::rename(&tmp_path, path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StorageError::WriteFailed(format!(
                "Failed to move {} into place: {}",
                path.display(),
                e
            )));
        }

        Ok(())
    }

    /// Undo a partially applied publish
    async fn unpublish(published: &[PathBuf]) {
        for path in published {
            if let Err(e) = fs::remove_file(path).await {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to roll back published file"
                );
            }
        }
    }
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    fn root(&self) -> &Path {
        &self.base_path
    }

    async fn begin_staging(&self, hash: &ContentHash) -> StorageResult<StagingArea> {
        let dir = self
            .staging_root()
            .join(format!("{}-{}", hash, Uuid::new_v4().simple()));

        fs::create_dir_all(&dir).await.map_err(|e| {
            StorageError::WriteFailed(format!(
                "Failed to create staging directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        tracing::debug!(hash = %hash, dir = %dir.display(), "Staging area created");

        Ok(StagingArea::new(hash.clone(), dir))
    }

    async fn write_staged(
        &self,
        staging: &mut StagingArea,
        filename: &str,
        data: Vec<u8>,
    ) -> StorageResult<PathBuf> {
        validate_filename(filename)?;

        let path = staging.dir().join(filename);
        let size = data.len();
        let start = Instant::now();

        Self::write_atomic(&path, &data).await?;
        staging.record(filename.to_string());

        tracing::info!(
            path = %path.display(),
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Staged file written"
        );

        Ok(path)
    }

    async fn publish(&self, staging: StagingArea) -> StorageResult<Vec<PathBuf>> {
        let start = Instant::now();
        let mut published = Vec::with_capacity(staging.files().len());

        for name in staging.files() {
            let from = staging.dir().join(name);
            let to = self.base_path.join(name);

            if let Err(e) = fs::rename(&from, &to).await {
                Self::unpublish(&published).await;
                let _ = fs::remove_dir_all(staging.dir()).await;
                return Err(StorageError::PublishFailed(format!(
                    "Failed to move {} to {}: {}",
                    from.display(),
                    to.display(),
                    e
                )));
            }
            published.push(to);
        }

        if let Err(e) = fs::remove_dir(staging.dir()).await {
            tracing::warn!(
                dir = %staging.dir().display(),
                error = %e,
                "Failed to remove empty staging directory"
            );
        }

        tracing::info!(
            hash = %staging.hash(),
            files = published.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Asset files published"
        );

        Ok(published)
    }

    async fn discard(&self, staging: StagingArea) -> StorageResult<()> {
        match fs::remove_dir_all(staging.dir()).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(StorageError::IoError(e)),
        }

        tracing::debug!(
            hash = %staging.hash(),
            files = staging.files().len(),
            "Staging area discarded"
        );

        Ok(())
    }

    async fn locate(&self, hash: &ContentHash, size: SizeClass) -> StorageResult<Option<PathBuf>> {
        let stem = asset_stem(hash, size);
        let mut entries = fs::read_dir(&self.base_path).await?;
        let mut matches = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let stem_matches = path
                .file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|s| s == stem);
            if stem_matches && entry.file_type().await?.is_file() {
                matches.push(path);
            }
        }

        // Directory order is unspecified; pick deterministically.
        matches.sort();
        Ok(matches.into_iter().next())
    }

    async fn read(&self, path: &Path) -> StorageResult<Vec<u8>> {
        if path.strip_prefix(&self.base_path).is_err() {
            return Err(StorageError::InvalidKey(path.display().to_string()));
        }

        let start = Instant::now();

        let data = fs::read(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(path.display().to_string())
            } else {
                StorageError::ReadFailed(format!("Failed to read file {}: {}", path.display(), e))
            }
        })?;

        tracing::info!(
            path = %path.display(),
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local file read successful"
        );

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::asset_filename;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_stage_publish_locate() {
        let dir = tempdir().unwrap();
        let store = LocalAssetStore::new(dir.path().join("assets")).await.unwrap();
        let hash = ContentHash::of_bytes(b"publish");

        let mut staging = store.begin_staging(&hash).await.unwrap();
        let display = asset_filename(&hash, SizeClass::Display, "webp");
        let thumb = asset_filename(&hash, SizeClass::Thumbnail, "webp");
        store
            .write_staged(&mut staging, &display, b"display".to_vec())
            .await
            .unwrap();
        store
            .write_staged(&mut staging, &thumb, b"thumb".to_vec())
            .await
            .unwrap();

        // Nothing is visible before publish
        assert!(store
            .locate(&hash, SizeClass::Display)
            .await
            .unwrap()
            .is_none());

        let staging_dir = staging.dir().to_path_buf();
        let published = store.publish(staging).await.unwrap();
        assert_eq!(published.len(), 2);
        assert!(!staging_dir.exists());

        let display_path = store
            .locate(&hash, SizeClass::Display)
            .await
            .unwrap()
            .unwrap();
        let thumb_path = store
            .locate(&hash, SizeClass::Thumbnail)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(store.read(&display_path).await.unwrap(), b"display");
        assert_eq!(store.read(&thumb_path).await.unwrap(), b"thumb");
    }

    #[tokio::test]
    async fn test_discard_removes_staged_files() {
        let dir = tempdir().unwrap();
        let store = LocalAssetStore::new(dir.path()).await.unwrap();
        let hash = ContentHash::of_bytes(b"discard");

        let mut staging = store.begin_staging(&hash).await.unwrap();
        let written = store
            .write_staged(&mut staging, "partial.webp", b"x".to_vec())
            .await
            .unwrap();
        assert!(written.exists());

        let staging_dir = staging.dir().to_path_buf();
        store.discard(staging).await.unwrap();
        assert!(!staging_dir.exists());
        assert!(store
            .locate(&hash, SizeClass::Display)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_staging_areas_are_private() {
        let dir = tempdir().unwrap();
        let store = LocalAssetStore::new(dir.path()).await.unwrap();
        let hash = ContentHash::of_bytes(b"same");

        let first = store.begin_staging(&hash).await.unwrap();
        let second = store.begin_staging(&hash).await.unwrap();
        assert_ne!(first.dir(), second.dir());
    }

    #[tokio::test]
    async fn test_locate_ignores_other_stems() {
        let dir = tempdir().unwrap();
        let store = LocalAssetStore::new(dir.path()).await.unwrap();
        let hash = ContentHash::of_bytes(b"stem");

        // Only a thumbnail exists; the display lookup must not pick it up.
        std::fs::write(dir.path().join(format!("{}_thumb.png", hash)), b"t").unwrap();
        std::fs::write(dir.path().join(format!("{}x.png", hash)), b"other").unwrap();

        assert!(store
            .locate(&hash, SizeClass::Display)
            .await
            .unwrap()
            .is_none());
        let thumb = store
            .locate(&hash, SizeClass::Thumbnail)
            .await
            .unwrap()
            .unwrap();
        assert!(thumb.ends_with(format!("{}_thumb.png", hash)));
    }

    #[tokio::test]
    async fn test_invalid_names_rejected() {
        let dir = tempdir().unwrap();
        let store = LocalAssetStore::new(dir.path()).await.unwrap();
        let hash = ContentHash::of_bytes(b"bad");
        let mut staging = store.begin_staging(&hash).await.unwrap();

        let result = store
            .write_staged(&mut staging, "../escape.webp", b"x".to_vec())
            .await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = store.read(Path::new("/etc/passwd")).await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }
}
