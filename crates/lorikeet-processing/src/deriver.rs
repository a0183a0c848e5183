//! Image deriver - produces the display image and thumbnail for an upload
//!
//! Decode, resize and encode run on the blocking thread pool; the encoded
//! bytes are then written into the upload's staging area. The source image is
//! always re-encoded, which also drops any embedded metadata.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use image::GenericImageView;
use lorikeet_core::{IngestConfig, OutputFormat, ProcessingError, SizeClass};
use lorikeet_storage::keys::asset_filename;
use lorikeet_storage::{AssetStore, StagingArea};

use crate::codec::ImageCodec;
use crate::scaling::ScalingPolicy;
use crate::validator::ValidatedUpload;

/// Paths and sizes of the files written for one upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedFiles {
    pub display_path: PathBuf,
    pub thumbnail_path: PathBuf,
    pub format: OutputFormat,
    pub original_dimensions: (u32, u32),
    pub display_dimensions: (u32, u32),
    pub thumbnail_dimensions: (u32, u32),
}

struct EncodedPair {
    display: Vec<u8>,
    thumbnail: Vec<u8>,
    original_dimensions: (u32, u32),
    display_dimensions: (u32, u32),
    thumbnail_dimensions: (u32, u32),
}

pub struct ImageDeriver {
    codec: Arc<dyn ImageCodec>,
    store: Arc<dyn AssetStore>,
}

impl ImageDeriver {
    pub fn new(codec: Arc<dyn ImageCodec>, store: Arc<dyn AssetStore>) -> Self {
        Self { codec, store }
    }

    /// Derive both size classes of `upload` into `staging`.
    ///
    /// On error some files may already be staged; the caller discards the
    /// staging area.
    #[tracing::instrument(skip(self, upload, staging, config), fields(hash = %upload.hash, mime_type = %upload.mime_type))]
    pub async fn derive(
        &self,
        upload: &ValidatedUpload,
        staging: &mut StagingArea,
        config: &IngestConfig,
    ) -> Result<DerivedFiles, ProcessingError> {
        let start = Instant::now();

        // Bytes the hash was computed from, not a second read of the temp file
        let data = upload.data.clone();

        let codec = Arc::clone(&self.codec);
        let mime_type = upload.mime_type;
        let display_policy = ScalingPolicy::display(config);
        let thumbnail_policy = ScalingPolicy::thumbnail(config);
        let format = config.output_format;
        let quality = config.output_quality;

        let encoded = tokio::task::spawn_blocking(move || -> Result<EncodedPair, ProcessingError> {
            let img = codec.decode(&data, mime_type)?;
            drop(data);

            let (width, height) = img.dimensions();
            let display_dimensions = display_policy.target_dimensions(width, height);
            let thumbnail_dimensions = thumbnail_policy.target_dimensions(width, height);

            let display = codec.resize(&img, display_dimensions.0, display_dimensions.1);
            let display = codec.encode(&display, format, quality)?;

            let thumbnail = codec.resize(&img, thumbnail_dimensions.0, thumbnail_dimensions.1);
            let thumbnail = codec.encode(&thumbnail, format, quality)?;

            Ok(EncodedPair {
                display,
                thumbnail,
                original_dimensions: (width, height),
                display_dimensions,
                thumbnail_dimensions,
            })
        })
        .await
        .map_err(|e| ProcessingError::Aborted(e.to_string()))??;

        let display_name = asset_filename(&upload.hash, SizeClass::Display, format.extension());
        let thumbnail_name =
            asset_filename(&upload.hash, SizeClass::Thumbnail, format.extension());

        let display_path = self
            .store
            .write_staged(staging, &display_name, encoded.display)
            .await
            .map_err(|e| ProcessingError::Write {
                path: staging.dir().join(&display_name),
                message: e.to_string(),
            })?;

        let thumbnail_path = self
            .store
            .write_staged(staging, &thumbnail_name, encoded.thumbnail)
            .await
            .map_err(|e| ProcessingError::Write {
                path: staging.dir().join(&thumbnail_name),
                message: e.to_string(),
            })?;

        tracing::info!(
            original = ?encoded.original_dimensions,
            display = ?encoded.display_dimensions,
            thumbnail = ?encoded.thumbnail_dimensions,
            format = %format,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Image derived"
        );

        Ok(DerivedFiles {
            display_path,
            thumbnail_path,
            format,
            original_dimensions: encoded.original_dimensions,
            display_dimensions: encoded.display_dimensions,
            thumbnail_dimensions: encoded.thumbnail_dimensions,
        })
    }
}
