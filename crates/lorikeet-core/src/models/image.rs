use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

use crate::constants::THUMBNAIL_SUFFIX;

/// Accepted input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageMimeType {
    Gif,
    Jpeg,
    Png,
    Bmp,
    WebP,
}

impl ImageMimeType {
    pub const ALL: [ImageMimeType; 5] = [
        ImageMimeType::Gif,
        ImageMimeType::Jpeg,
        ImageMimeType::Png,
        ImageMimeType::Bmp,
        ImageMimeType::WebP,
    ];

    /// Look up a detected MIME type in the whitelist. Parameters such as
    /// `; charset=binary` are ignored.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/gif" => Some(ImageMimeType::Gif),
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(ImageMimeType::Jpeg),
            "image/png" => Some(ImageMimeType::Png),
            "image/bmp" | "image/x-ms-bmp" | "image/x-bmp" => Some(ImageMimeType::Bmp),
            "image/webp" => Some(ImageMimeType::WebP),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageMimeType::Gif => "image/gif",
            ImageMimeType::Jpeg => "image/jpeg",
            ImageMimeType::Png => "image/png",
            ImageMimeType::Bmp => "image/bmp",
            ImageMimeType::WebP => "image/webp",
        }
    }
}

impl Display for ImageMimeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Which derived file of an asset is meant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    Display,
    Thumbnail,
}

impl SizeClass {
    /// Suffix appended to the content hash to form the filename stem
    pub fn suffix(&self) -> &'static str {
        match self {
            SizeClass::Display => "",
            SizeClass::Thumbnail => THUMBNAIL_SUFFIX,
        }
    }

    pub fn from_thumbnail_flag(want_thumbnail: bool) -> Self {
        if want_thumbnail {
            SizeClass::Thumbnail
        } else {
            SizeClass::Display
        }
    }
}

/// Bytes of a stored image, ready to hand to a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ServedImage {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
