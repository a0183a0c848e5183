//! Error types module
//!
//! Every failure the pipeline can report falls into one of four families:
//! transport (the upload never arrived intact), validation (user-correctable),
//! processing (decode/encode/write) and persistence (the repository). They are
//! unified under [`IngestError`], which self-describes through [`ErrorMetadata`].
//!
//! The `From<sqlx::Error>` conversion is gated behind the `sqlx` feature.

use std::io;
use std::path::PathBuf;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for bad input that got past validation
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be presented to a caller
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "DUPLICATE_ASSET")
    fn error_code(&self) -> &'static str;

    /// Whether the uploader can fix this by sending something different
    fn is_user_correctable(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// The upload mechanics failed before the file reached us
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("The uploaded file exceeds the server max file size.")]
    ExceedsServerLimit,

    #[error("The uploaded file exceeds the form max file size.")]
    ExceedsFormLimit,

    #[error("The uploaded file was only partially uploaded.")]
    PartialUpload,

    #[error("No file was uploaded.")]
    NoFile,

    #[error("Missing a temporary folder.")]
    NoTempDir,

    #[error("Failed to write file to disk.")]
    WriteFailure,

    #[error("An extension stopped the file upload.")]
    ExtensionBlocked,

    #[error("Unknown error on file upload.")]
    Unknown,
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("No file upload detected.")]
    NoUpload,

    #[error("Temporary upload file not found: {}", .0.display())]
    TempFileMissing(PathBuf),

    #[error("Failed to read uploaded file {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Zero-size file uploaded.")]
    EmptyFile,

    #[error("File is larger than image upload limit: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Duplicate image already exists: {0}")]
    Duplicate(String),

    #[error("Invalid MIME type: {0}")]
    InvalidMimeType(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Failed to read uploaded image file ({mime_type}): {message}")]
    Decode { mime_type: String, message: String },

    #[error("Failed to encode {format} image: {message}")]
    Encode { format: String, message: String },

    #[error("Failed to save {} image: {message}", .path.display())]
    Write { path: PathBuf, message: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Image task aborted: {0}")]
    Aborted(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Duplicate image already exists: {0}")]
    Duplicate(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Stored record is invalid: {0}")]
    InvalidRecord(String),
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Processing(#[from] ProcessingError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("{0} is not implemented")]
    Unimplemented(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for PersistenceError {
    fn from(err: SqlxError) -> Self {
        if let SqlxError::Database(ref db_err) = err {
            // 22001: string_data_right_truncation (value longer than the column)
            let too_long = db_err.code().as_deref() == Some("22001");
            if too_long
                || db_err.is_unique_violation()
                || db_err.is_check_violation()
                || db_err.is_foreign_key_violation()
            {
                return PersistenceError::Constraint(db_err.message().to_string());
            }
        }
        PersistenceError::Database(err)
    }
}

impl IngestError {
    /// Whether this failure is a duplicate-content rejection, from either the
    /// validator's pre-check or the repository's insert.
    pub fn is_duplicate(&self) -> bool {
        matches!(
            self,
            IngestError::Validation(ValidationError::Duplicate(_))
                | IngestError::Persistence(PersistenceError::Duplicate(_))
        )
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

/// Static metadata for each family: (error_code, user_correctable, log_level).
fn ingest_error_static_metadata(err: &IngestError) -> (&'static str, bool, LogLevel) {
    match err {
        IngestError::Transport(_) => ("TRANSPORT_ERROR", true, LogLevel::Debug),
        IngestError::Validation(ValidationError::Duplicate(_)) => {
            ("DUPLICATE_ASSET", true, LogLevel::Debug)
        }
        IngestError::Validation(ValidationError::FileTooLarge { .. }) => {
            ("PAYLOAD_TOO_LARGE", true, LogLevel::Debug)
        }
        IngestError::Validation(ValidationError::InvalidMimeType(_)) => {
            ("INVALID_MIME_TYPE", true, LogLevel::Debug)
        }
        IngestError::Validation(ValidationError::Unreadable { .. }) => {
            ("UPLOAD_UNREADABLE", false, LogLevel::Error)
        }
        IngestError::Validation(_) => ("INVALID_UPLOAD", true, LogLevel::Debug),
        IngestError::Processing(ProcessingError::Decode { .. }) => {
            ("IMAGE_DECODE_ERROR", true, LogLevel::Warn)
        }
        IngestError::Processing(_) => ("IMAGE_PROCESSING_ERROR", false, LogLevel::Error),
        IngestError::Persistence(PersistenceError::Duplicate(_)) => {
            ("DUPLICATE_ASSET", true, LogLevel::Debug)
        }
        IngestError::Persistence(PersistenceError::Constraint(_)) => {
            ("CONSTRAINT_VIOLATION", true, LogLevel::Warn)
        }
        IngestError::Persistence(_) => ("DATABASE_ERROR", false, LogLevel::Error),
        IngestError::Unimplemented(_) => ("NOT_IMPLEMENTED", false, LogLevel::Warn),
        IngestError::Config(_) => ("CONFIG_ERROR", false, LogLevel::Error),
    }
}

impl ErrorMetadata for IngestError {
    fn error_code(&self) -> &'static str {
        ingest_error_static_metadata(self).0
    }

    fn is_user_correctable(&self) -> bool {
        ingest_error_static_metadata(self).1
    }

    fn log_level(&self) -> LogLevel {
        ingest_error_static_metadata(self).2
    }
}
