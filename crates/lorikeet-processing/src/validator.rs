use std::path::PathBuf;
use std::sync::Arc;

use lorikeet_core::{
    ContentHash, IngestConfig, IngestError, ImageMimeType, UploadDescriptor, ValidationError,
};
use lorikeet_db::AssetRepository;
use tokio::fs;

use crate::codec::ImageCodec;

/// An upload that passed every check and may be derived.
///
/// `data` holds the exact bytes `hash` was computed from; derivation works
/// from these and never re-reads `path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUpload {
    pub hash: ContentHash,
    pub mime_type: ImageMimeType,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub data: Vec<u8>,
}

/// Upload validator
///
/// Runs the ordered, short-circuiting acceptance checks: transport status,
/// temporary file presence, size bounds, duplicate content, then sniffed MIME
/// type. The duplicate lookup is a fast-fail only; the repository's insert is
/// what actually guarantees uniqueness.
pub struct UploadValidator {
    repository: Arc<dyn AssetRepository>,
    codec: Arc<dyn ImageCodec>,
}

impl UploadValidator {
    pub fn new(repository: Arc<dyn AssetRepository>, codec: Arc<dyn ImageCodec>) -> Self {
        Self { repository, codec }
    }

    #[tracing::instrument(skip(self, upload, config), fields(original_name = ?upload.original_name))]
    pub async fn validate(
        &self,
        upload: &UploadDescriptor,
        config: &IngestConfig,
    ) -> Result<ValidatedUpload, IngestError> {
        upload.transport_status.check()?;

        let path = upload
            .temporary_path
            .clone()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(ValidationError::NoUpload)?;

        let metadata = match fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => return Err(ValidationError::TempFileMissing(path).into()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ValidationError::TempFileMissing(path).into())
            }
            Err(source) => return Err(ValidationError::Unreadable { path, source }.into()),
        };

        self.validate_file_size(metadata.len(), config)?;

        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(source) => return Err(ValidationError::Unreadable { path, source }.into()),
        };
        // The file may have changed since the metadata call
        let size_bytes = data.len() as u64;
        self.validate_file_size(size_bytes, config)?;

        let hash = ContentHash::of_bytes(&data);
        if self.repository.exists(&hash).await? {
            tracing::debug!(hash = %hash, "Upload rejected as duplicate");
            return Err(ValidationError::Duplicate(hash.to_string()).into());
        }

        let detected = self.codec.detect_mime_type(&data);
        let mime_type = ImageMimeType::from_mime(&detected)
            .ok_or(ValidationError::InvalidMimeType(detected))?;

        tracing::debug!(
            hash = %hash,
            mime_type = %mime_type,
            size_bytes = size_bytes,
            "Upload validated"
        );

        Ok(ValidatedUpload {
            hash,
            mime_type,
            path,
            size_bytes,
            data,
        })
    }

    /// Validate file size against the configured cap (inclusive)
    pub fn validate_file_size(
        &self,
        size: u64,
        config: &IngestConfig,
    ) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        let max = config.max_filesize_bytes();
        if size > max {
            return Err(ValidationError::FileTooLarge { size, max });
        }

        Ok(())
    }
}
