mod helpers;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use helpers::fixtures;
use helpers::{setup_test_app, setup_with_repository, setup_with_store};
use image::ImageFormat;
use lorikeet_core::{
    Asset, AssetRecord, AssetSummary, ContentHash, ErrorMetadata, IngestConfig, IngestError,
    PersistenceError, ProcessingError, SizeClass, Tag, TagRecord, TransportStatus,
    UploadDescriptor, ValidationError,
};
use lorikeet_services::{
    AssetRepository, AssetStore, LocalAssetStore, MemoryAssetRepository, UploadMetadata,
};
use lorikeet_storage::{StagingArea, StorageError, StorageResult};

fn metadata(title: &str, tags: &str) -> UploadMetadata {
    UploadMetadata {
        uploader: "tester".to_string(),
        title: Some(title.to_string()),
        caption: None,
        tags: vec![tags.to_string()],
    }
}

#[tokio::test]
async fn test_upload_png_publishes_both_sizes() {
    let app = setup_test_app().await;
    let data = fixtures::png(400, 300, 10);
    let upload = app.upload_file("bird.png", &data);

    let hash = app
        .service
        .upload(&upload, &metadata("Rainbow lorikeet", "birds, parrots"))
        .await
        .unwrap();

    assert_eq!(hash, ContentHash::of_bytes(&data));
    assert_eq!(
        app.published_files(),
        vec![format!("{}.webp", hash), format!("{}_thumb.webp", hash)]
    );
    assert_eq!(app.staged_entries(), 0);

    let display = image::open(app.asset_dir.join(format!("{}.webp", hash))).unwrap();
    assert_eq!((display.width(), display.height()), (200, 150));
    let thumb = image::open(app.asset_dir.join(format!("{}_thumb.webp", hash))).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (50, 37));

    let asset = app.service.get_by_id(&hash).await.unwrap().unwrap();
    assert_eq!(asset.title.as_deref(), Some("Rainbow lorikeet"));
    assert_eq!(asset.uploader, "tester");

    let tags: Vec<String> = app
        .service
        .tags(&hash)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.tag_name)
        .collect();
    assert_eq!(tags, vec!["birds", "parrots"]);
}

#[tokio::test]
async fn test_each_whitelisted_format_accepted() {
    let app = setup_test_app().await;
    let formats = [
        ImageFormat::Gif,
        ImageFormat::Jpeg,
        ImageFormat::Png,
        ImageFormat::Bmp,
        ImageFormat::WebP,
    ];

    for (i, format) in formats.into_iter().enumerate() {
        let data = fixtures::encoded_image(format, 60, 40, i as u8 * 40);
        let upload = app.upload_file(&format!("upload-{}", i), &data);
        let hash = app
            .service
            .upload(&upload, &UploadMetadata::default())
            .await
            .unwrap_or_else(|e| panic!("{:?} rejected: {}", format, e));
        assert!(app.service.get_by_id(&hash).await.unwrap().is_some());
    }

    assert_eq!(app.repository.asset_count(), 5);
    assert_eq!(app.published_files().len(), 10);
}

#[tokio::test]
async fn test_duplicate_upload_rejected() {
    let app = setup_test_app().await;
    let data = fixtures::png(80, 80, 90);

    let first = app.upload_file("first.png", &data);
    let hash = app
        .service
        .upload(&first, &metadata("First", "a"))
        .await
        .unwrap();

    let second = app.upload_file("second.png", &data);
    let err = app
        .service
        .upload(&second, &metadata("Second", "b"))
        .await
        .unwrap_err();

    assert!(err.is_duplicate());
    assert_eq!(err.error_code(), "DUPLICATE_ASSET");
    assert_eq!(app.repository.asset_count(), 1);
    assert_eq!(app.published_files().len(), 2);

    // The original record is untouched
    let asset = app.service.get_by_id(&hash).await.unwrap().unwrap();
    assert_eq!(asset.title.as_deref(), Some("First"));
}

#[tokio::test]
async fn test_two_distinct_uploads() {
    let app = setup_test_app().await;

    let a = app.upload_file("a.png", &fixtures::png(30, 30, 1));
    let b = app.upload_file("b.png", &fixtures::png(30, 30, 2));
    let hash_a = app.service.upload(&a, &metadata("A", "")).await.unwrap();
    let hash_b = app.service.upload(&b, &metadata("B", "")).await.unwrap();

    assert_ne!(hash_a, hash_b);
    assert_eq!(app.published_files().len(), 4);
}

#[tokio::test]
async fn test_rejections_leave_no_trace() {
    let app = setup_test_app().await;
    let config = IngestConfig {
        max_filesize_mb: 1,
        ..app.service.config().clone()
    };

    let cases: Vec<(UploadDescriptor, &str)> = vec![
        (
            UploadDescriptor::failed(TransportStatus::from_code(1)),
            "The uploaded file exceeds the server max file size.",
        ),
        (
            UploadDescriptor::failed(TransportStatus::Ok),
            "No file upload detected.",
        ),
        (app.upload_file("empty.png", b""), "Zero-size file uploaded."),
        (
            app.upload_file("doc.pdf", &fixtures::pdf()),
            "Invalid MIME type: application/pdf",
        ),
    ];

    for (upload, message) in cases {
        let err = app
            .service
            .upload_with_config(&upload, &UploadMetadata::default(), &config)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), message);
        assert!(err.is_user_correctable());
    }

    let too_big = app.upload_file("big.bin", &vec![7u8; 1024 * 1024 + 1]);
    let err = app
        .service
        .upload_with_config(&too_big, &UploadMetadata::default(), &config)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        IngestError::Validation(ValidationError::FileTooLarge { .. })
    ));

    assert_eq!(app.repository.asset_count(), 0);
    assert!(app.published_files().is_empty());
    assert_eq!(app.staged_entries(), 0);
}

#[tokio::test]
async fn test_corrupt_image_discards_staging() {
    let app = setup_test_app().await;
    // Valid PNG signature, truncated body: passes sniffing, fails decoding
    let mut data = fixtures::png(64, 64, 3);
    data.truncate(60);
    let upload = app.upload_file("broken.png", &data);

    let err = app
        .service
        .upload(&upload, &UploadMetadata::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        IngestError::Processing(ProcessingError::Decode { .. })
    ));
    assert_eq!(app.repository.asset_count(), 0);
    assert!(app.published_files().is_empty());
    assert_eq!(app.staged_entries(), 0);
}

#[tokio::test]
async fn test_oversized_tag_rolls_back_everything() {
    let app = setup_test_app().await;
    let upload = app.upload_file("tagged.png", &fixtures::png(20, 20, 5));
    let long_tag = "t".repeat(65);

    let err = app
        .service
        .upload(&upload, &metadata("Tagged", &format!("ok, {}", long_tag)))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        IngestError::Persistence(PersistenceError::Constraint(_))
    ));
    assert_eq!(app.repository.asset_count(), 0);
    assert_eq!(app.repository.tag_count(), 0);
    assert!(app.published_files().is_empty());
    assert_eq!(app.staged_entries(), 0);
}

#[tokio::test]
async fn test_width_cap_with_unlimited_height_end_to_end() {
    let app = setup_test_app().await;
    let config = IngestConfig {
        max_width: 1000,
        max_height: 0,
        thumbnail_max_width: 250,
        thumbnail_max_height: 250,
        max_filesize_mb: 8,
        ..app.service.config().clone()
    };
    let data = fixtures::encoded_image(ImageFormat::Jpeg, 4000, 3000, 70);
    let upload = app.upload_file("photo.jpg", &data);

    let hash = app
        .service
        .upload_with_config(&upload, &metadata("Photo", "landscape"), &config)
        .await
        .unwrap();

    let display = app.service.serve(&hash, false).await.unwrap().unwrap();
    assert_eq!(display.content_type, "image/webp");
    let decoded = image::load_from_memory(&display.bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (1000, 750));

    let thumb = app.service.serve(&hash, true).await.unwrap().unwrap();
    assert_eq!(thumb.content_type, "image/webp");
    let decoded = image::load_from_memory(&thumb.bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (250, 187));
}

#[tokio::test]
async fn test_webp_dimension_limit_is_an_encode_error() {
    let app = setup_test_app().await;
    let config = IngestConfig {
        max_width: 0,
        max_height: 0,
        ..app.service.config().clone()
    };
    let upload = app.upload_file("panorama.png", &fixtures::png(17000, 2, 5));

    let err = app
        .service
        .upload_with_config(&upload, &metadata("Panorama", "wide"), &config)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        IngestError::Processing(ProcessingError::Encode { .. })
    ));
    assert_eq!(app.repository.asset_count(), 0);
    assert_eq!(app.repository.tag_count(), 0);
    assert!(app.published_files().is_empty());
    assert_eq!(app.staged_entries(), 0);
}

/// Repository that always claims the hash is new, as if a concurrent upload
/// of the same bytes had not committed yet when the validator looked.
struct RacingRepository(MemoryAssetRepository);

#[async_trait]
impl AssetRepository for RacingRepository {
    async fn exists(&self, _id: &ContentHash) -> Result<bool, PersistenceError> {
        Ok(false)
    }

    async fn insert_asset(
        &self,
        asset: &AssetRecord,
        tags: &[TagRecord],
    ) -> Result<Asset, PersistenceError> {
        self.0.insert_asset(asset, tags).await
    }

    async fn get(&self, id: &ContentHash) -> Result<Option<Asset>, PersistenceError> {
        self.0.get(id).await
    }

    async fn list_with_tags(&self) -> Result<Vec<AssetSummary>, PersistenceError> {
        self.0.list_with_tags().await
    }

    async fn tags_for(&self, id: &ContentHash) -> Result<Vec<Tag>, PersistenceError> {
        self.0.tags_for(id).await
    }

    async fn delete(&self, id: &ContentHash) -> Result<bool, PersistenceError> {
        self.0.delete(id).await
    }
}

#[tokio::test]
async fn test_insert_is_the_uniqueness_guard() {
    let app = setup_with_repository(MemoryAssetRepository::new(), |repo| {
        Arc::new(RacingRepository(repo)) as Arc<dyn AssetRepository>
    })
    .await;
    let data = fixtures::png(40, 40, 77);

    let first = app.upload_file("first.png", &data);
    app.service
        .upload(&first, &metadata("Winner", ""))
        .await
        .unwrap();

    let second = app.upload_file("second.png", &data);
    let err = app
        .service
        .upload(&second, &metadata("Loser", ""))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        IngestError::Persistence(PersistenceError::Duplicate(_))
    ));
    assert!(err.is_duplicate());
    assert_eq!(app.repository.asset_count(), 1);
    assert_eq!(app.published_files().len(), 2);
    assert_eq!(app.staged_entries(), 0);
}

/// Store whose publish step always fails
struct FailingPublishStore(LocalAssetStore);

#[async_trait]
impl AssetStore for FailingPublishStore {
    fn root(&self) -> &Path {
        self.0.root()
    }

    async fn begin_staging(&self, hash: &ContentHash) -> StorageResult<StagingArea> {
        self.0.begin_staging(hash).await
    }

    async fn write_staged(
        &self,
        staging: &mut StagingArea,
        filename: &str,
        data: Vec<u8>,
    ) -> StorageResult<PathBuf> {
        self.0.write_staged(staging, filename, data).await
    }

    async fn publish(&self, staging: StagingArea) -> StorageResult<Vec<PathBuf>> {
        self.0.discard(staging).await?;
        Err(StorageError::PublishFailed("disk full".to_string()))
    }

    async fn discard(&self, staging: StagingArea) -> StorageResult<()> {
        self.0.discard(staging).await
    }

    async fn locate(
        &self,
        hash: &ContentHash,
        size: SizeClass,
    ) -> StorageResult<Option<PathBuf>> {
        self.0.locate(hash, size).await
    }

    async fn read(&self, path: &Path) -> StorageResult<Vec<u8>> {
        self.0.read(path).await
    }
}

#[tokio::test]
async fn test_publish_failure_removes_row() {
    let app = setup_with_store(|store| Arc::new(FailingPublishStore(store)) as Arc<dyn AssetStore>)
        .await;
    let upload = app.upload_file("doomed.png", &fixtures::png(16, 16, 200));

    let err = app
        .service
        .upload(&upload, &metadata("Doomed", "x"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        IngestError::Processing(ProcessingError::Storage(_))
    ));
    assert!(!err.is_user_correctable());
    assert_eq!(app.repository.asset_count(), 0);
    assert_eq!(app.repository.tag_count(), 0);
    assert!(app.published_files().is_empty());
}
