use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// Outcome of the transport that delivered an upload to a temporary file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportStatus {
    Ok,
    ExceedsServerLimit,
    ExceedsFormLimit,
    Partial,
    NoFile,
    NoTempDir,
    WriteFailure,
    ExtensionBlocked,
    Unknown,
}

impl TransportStatus {
    /// Map the conventional numeric upload status codes.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => TransportStatus::Ok,
            1 => TransportStatus::ExceedsServerLimit,
            2 => TransportStatus::ExceedsFormLimit,
            3 => TransportStatus::Partial,
            4 => TransportStatus::NoFile,
            6 => TransportStatus::NoTempDir,
            7 => TransportStatus::WriteFailure,
            8 => TransportStatus::ExtensionBlocked,
            _ => TransportStatus::Unknown,
        }
    }

    /// `Ok(())` for a successful transport, otherwise the matching error.
    pub fn check(self) -> Result<(), TransportError> {
        match self {
            TransportStatus::Ok => Ok(()),
            TransportStatus::ExceedsServerLimit => Err(TransportError::ExceedsServerLimit),
            TransportStatus::ExceedsFormLimit => Err(TransportError::ExceedsFormLimit),
            TransportStatus::Partial => Err(TransportError::PartialUpload),
            TransportStatus::NoFile => Err(TransportError::NoFile),
            TransportStatus::NoTempDir => Err(TransportError::NoTempDir),
            TransportStatus::WriteFailure => Err(TransportError::WriteFailure),
            TransportStatus::ExtensionBlocked => Err(TransportError::ExtensionBlocked),
            TransportStatus::Unknown => Err(TransportError::Unknown),
        }
    }
}

/// What the transport layer knows about one uploaded file.
///
/// `declared_size` is informational only; the validator measures the file on
/// disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadDescriptor {
    pub transport_status: TransportStatus,
    pub temporary_path: Option<PathBuf>,
    pub original_name: Option<String>,
    pub declared_size: Option<u64>,
}

impl UploadDescriptor {
    /// Descriptor for a file that already sits on local disk, as used by the
    /// CLI and tests.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let original_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        Self {
            transport_status: TransportStatus::Ok,
            temporary_path: Some(path),
            original_name,
            declared_size: None,
        }
    }

    pub fn failed(status: TransportStatus) -> Self {
        Self {
            transport_status: status,
            temporary_path: None,
            original_name: None,
            declared_size: None,
        }
    }
}
