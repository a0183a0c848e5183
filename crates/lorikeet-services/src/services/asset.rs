use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use lorikeet_core::{
    Asset, AssetSummary, ContentHash, ErrorMetadata, IngestConfig, IngestError, LogLevel,
    ProcessingError, ServedImage, SizeClass, Tag, UploadDescriptor,
};
use lorikeet_db::AssetRepository;
use lorikeet_processing::{
    AssetRecordBuilder, ImageCodec, ImageDeriver, RasterCodec, UploadMetadata, UploadValidator,
};
use lorikeet_storage::{AssetStore, LocalAssetStore, StagingArea, StorageError};

/// Image asset service
///
/// Upload path: validate → derive into a private staging area → insert the
/// asset and tag rows in one transaction → publish the staged files. Nothing
/// becomes visible in the asset directory unless its row was recorded.
#[derive(Clone)]
pub struct AssetService {
    config: IngestConfig,
    repository: Arc<dyn AssetRepository>,
    store: Arc<dyn AssetStore>,
    codec: Arc<dyn ImageCodec>,
    validator: Arc<UploadValidator>,
    deriver: Arc<ImageDeriver>,
}

fn storage_error(err: StorageError) -> IngestError {
    ProcessingError::Storage(err.to_string()).into()
}

fn log_failure(operation: &str, err: &IngestError) {
    match err.log_level() {
        LogLevel::Debug => tracing::debug!(
            operation,
            error_code = err.error_code(),
            error = %err,
            "Asset operation rejected"
        ),
        LogLevel::Warn => tracing::warn!(
            operation,
            error_code = err.error_code(),
            error = %err,
            "Asset operation failed"
        ),
        LogLevel::Error => tracing::error!(
            operation,
            error_code = err.error_code(),
            error = %err.detailed_message(),
            "Asset operation failed"
        ),
    }
}

impl AssetService {
    pub fn new(
        config: IngestConfig,
        repository: Arc<dyn AssetRepository>,
        store: Arc<dyn AssetStore>,
    ) -> Self {
        Self::with_codec(config, repository, store, Arc::new(RasterCodec::new()))
    }

    pub fn with_codec(
        config: IngestConfig,
        repository: Arc<dyn AssetRepository>,
        store: Arc<dyn AssetStore>,
        codec: Arc<dyn ImageCodec>,
    ) -> Self {
        let validator = Arc::new(UploadValidator::new(
            Arc::clone(&repository),
            Arc::clone(&codec),
        ));
        let deriver = Arc::new(ImageDeriver::new(Arc::clone(&codec), Arc::clone(&store)));

        Self {
            config,
            repository,
            store,
            codec,
            validator,
            deriver,
        }
    }

    /// Service storing files under `config.asset_directory` on local disk
    pub async fn local(
        config: IngestConfig,
        repository: Arc<dyn AssetRepository>,
    ) -> Result<Self, IngestError> {
        config
            .validate()
            .map_err(|e| IngestError::Config(e.to_string()))?;
        let store = LocalAssetStore::new(&config.asset_directory)
            .await
            .map_err(|e| IngestError::Config(e.to_string()))?;
        Ok(Self::new(config, repository, Arc::new(store)))
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    pub fn asset_directory(&self) -> &Path {
        self.store.root()
    }

    /// Ingest one upload with the service's configuration. Returns the
    /// content hash that identifies the new asset.
    pub async fn upload(
        &self,
        upload: &UploadDescriptor,
        metadata: &UploadMetadata,
    ) -> Result<ContentHash, IngestError> {
        self.upload_with_config(upload, metadata, &self.config)
            .await
    }

    /// Ingest one upload with per-call limits and output settings.
    ///
    /// Files always go to this service's store; `config.asset_directory` is
    /// not consulted.
    #[tracing::instrument(skip(self, upload, metadata, config), fields(original_name = ?upload.original_name, uploader = %metadata.uploader))]
    pub async fn upload_with_config(
        &self,
        upload: &UploadDescriptor,
        metadata: &UploadMetadata,
        config: &IngestConfig,
    ) -> Result<ContentHash, IngestError> {
        let start = Instant::now();

        let result = self.ingest(upload, metadata, config).await;

        match &result {
            Ok(hash) => tracing::info!(
                hash = %hash,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Image uploaded"
            ),
            Err(err) => log_failure("upload", err),
        }

        result
    }

    async fn ingest(
        &self,
        upload: &UploadDescriptor,
        metadata: &UploadMetadata,
        config: &IngestConfig,
    ) -> Result<ContentHash, IngestError> {
        let validated = self.validator.validate(upload, config).await?;
        let hash = validated.hash.clone();

        let mut staging = self
            .store
            .begin_staging(&hash)
            .await
            .map_err(storage_error)?;

        if let Err(err) = self.deriver.derive(&validated, &mut staging, config).await {
            self.discard(staging).await;
            return Err(err.into());
        }

        let (record, tags) = AssetRecordBuilder::from_metadata(hash.clone(), metadata).build();

        // The insert is the real uniqueness guard; a concurrent upload of the
        // same bytes loses here and its staged files are dropped.
        if let Err(err) = self.repository.insert_asset(&record, &tags).await {
            self.discard(staging).await;
            return Err(err.into());
        }

        if let Err(err) = self.store.publish(staging).await {
            tracing::error!(hash = %hash, error = %err, "Publish failed, removing asset row");
            if let Err(delete_err) = self.repository.delete(&hash).await {
                tracing::error!(
                    hash = %hash,
                    error = %delete_err,
                    "Failed to remove asset row after publish failure"
                );
            }
            return Err(storage_error(err));
        }

        Ok(hash)
    }

    async fn discard(&self, staging: StagingArea) {
        let hash = staging.hash().clone();
        if let Err(e) = self.store.discard(staging).await {
            tracing::warn!(hash = %hash, error = %e, "Failed to discard staging area");
        }
    }

    pub async fn get_by_id(&self, hash: &ContentHash) -> Result<Option<Asset>, IngestError> {
        Ok(self.repository.get(hash).await?)
    }

    /// All assets with their comma-joined tags, ordered by title
    pub async fn list_all(&self) -> Result<Vec<AssetSummary>, IngestError> {
        Ok(self.repository.list_with_tags().await?)
    }

    pub async fn tags(&self, hash: &ContentHash) -> Result<Vec<Tag>, IngestError> {
        Ok(self.repository.tags_for(hash).await?)
    }

    /// Bytes and content type of an asset's display image or thumbnail.
    ///
    /// `None` when the asset is not recorded or no stored file matches.
    #[tracing::instrument(skip(self), fields(hash = %hash))]
    pub async fn serve(
        &self,
        hash: &ContentHash,
        want_thumbnail: bool,
    ) -> Result<Option<ServedImage>, IngestError> {
        if self.repository.get(hash).await?.is_none() {
            return Ok(None);
        }

        let size = SizeClass::from_thumbnail_flag(want_thumbnail);
        let Some(path) = self
            .store
            .locate(hash, size)
            .await
            .map_err(storage_error)?
        else {
            tracing::warn!(size = ?size, "Asset is recorded but no stored file matches");
            return Ok(None);
        };

        let bytes = match self.store.read(&path).await {
            Ok(bytes) => bytes,
            // Removed between locate and read
            Err(StorageError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(storage_error(e)),
        };
        let content_type = self.codec.detect_mime_type(&bytes);

        Ok(Some(ServedImage {
            content_type,
            bytes,
        }))
    }

    pub async fn search_titles(&self, _query: &str) -> Result<Vec<AssetSummary>, IngestError> {
        Err(IngestError::Unimplemented("search_titles"))
    }

    pub async fn search_captions(&self, _query: &str) -> Result<Vec<AssetSummary>, IngestError> {
        Err(IngestError::Unimplemented("search_captions"))
    }

    pub async fn search_tags(&self, _query: &str) -> Result<Vec<AssetSummary>, IngestError> {
        Err(IngestError::Unimplemented("search_tags"))
    }

    pub async fn search(&self, _query: &str) -> Result<Vec<AssetSummary>, IngestError> {
        Err(IngestError::Unimplemented("search"))
    }

    pub async fn edit(
        &self,
        _hash: &ContentHash,
        _metadata: &UploadMetadata,
    ) -> Result<Asset, IngestError> {
        Err(IngestError::Unimplemented("edit"))
    }

    pub async fn delete(&self, _hash: &ContentHash) -> Result<bool, IngestError> {
        Err(IngestError::Unimplemented("delete"))
    }

    pub async fn change_save_directory(&self, _directory: &Path) -> Result<(), IngestError> {
        Err(IngestError::Unimplemented("change_save_directory"))
    }
}
