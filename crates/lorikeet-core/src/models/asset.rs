use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

/// Length of a hex-encoded SHA-256 digest
pub const CONTENT_HASH_LEN: usize = 64;

/// Identity of an asset: the lowercase hex SHA-256 of the original upload.
///
/// Doubles as the filename stem of every stored file for the asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

impl ContentHash {
    /// Hash raw file bytes
    pub fn of_bytes(data: &[u8]) -> Self {
        Self::from_digest(Sha256::digest(data).as_slice())
    }

    pub fn from_digest(digest: &[u8]) -> Self {
        ContentHash(hex::encode(digest))
    }

    /// Accept an externally supplied identifier (e.g. from a URL or CLI
    /// argument). Uppercase hex is folded to lowercase.
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s.len() != CONTENT_HASH_LEN || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(format!(
                "content hash must be {} hex characters, got {:?}",
                CONTENT_HASH_LEN, s
            ));
        }
        Ok(ContentHash(s.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ContentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.pad(&self.0)
    }
}

impl FromStr for ContentHash {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentHash::parse(s)
    }
}

impl TryFrom<String> for ContentHash {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ContentHash::parse(&value)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}

impl AsRef<str> for ContentHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A stored image asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct Asset {
    #[cfg_attr(feature = "sqlx", sqlx(rename = "image_id"))]
    pub id: ContentHash,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "image_title"))]
    pub title: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "image_caption"))]
    pub caption: Option<String>,
    pub uploader: String,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "uploaded"))]
    pub uploaded_at: DateTime<Utc>,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "edited"))]
    pub edited_at: DateTime<Utc>,
}

/// An asset together with its tags joined into one comma-separated string,
/// as produced by the list view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct AssetSummary {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub asset: Asset,
    pub tags: Option<String>,
}

impl AssetSummary {
    /// Individual tag names, in stored order
    pub fn tag_names(&self) -> Vec<&str> {
        self.tags
            .as_deref()
            .map(|t| t.split(',').filter(|s| !s.is_empty()).collect())
            .unwrap_or_default()
    }
}

/// A tag attached to an asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct Tag {
    #[cfg_attr(feature = "sqlx", sqlx(rename = "tag_id"))]
    pub id: i64,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "image_id"))]
    pub asset_id: ContentHash,
    pub tag_name: String,
}

/// Row to insert into the image table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: ContentHash,
    pub title: Option<String>,
    pub caption: Option<String>,
    pub uploader: String,
}

/// Row to insert into the tag table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagRecord {
    pub asset_id: ContentHash,
    pub tag_name: String,
}
