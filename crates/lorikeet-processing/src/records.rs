use lorikeet_core::{AssetRecord, ContentHash, TagRecord};
use serde::{Deserialize, Serialize};

use crate::tags::normalize_tags;

/// Descriptive fields supplied alongside an upload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadMetadata {
    pub uploader: String,
    pub title: Option<String>,
    pub caption: Option<String>,
    /// Raw tag fields, each possibly comma-separated
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Assembles the rows written for a new asset
#[derive(Debug, Clone)]
pub struct AssetRecordBuilder {
    hash: ContentHash,
    uploader: String,
    title: Option<String>,
    caption: Option<String>,
    tags: Vec<String>,
}

impl AssetRecordBuilder {
    pub fn new(hash: ContentHash, uploader: impl Into<String>) -> Self {
        Self {
            hash,
            uploader: uploader.into(),
            title: None,
            caption: None,
            tags: Vec::new(),
        }
    }

    pub fn from_metadata(hash: ContentHash, metadata: &UploadMetadata) -> Self {
        Self::new(hash, metadata.uploader.clone())
            .title(metadata.title.as_deref())
            .caption(metadata.caption.as_deref())
            .tags(&metadata.tags)
    }

    pub fn title(mut self, title: Option<&str>) -> Self {
        self.title = non_blank(title);
        self
    }

    pub fn caption(mut self, caption: Option<&str>) -> Self {
        self.caption = non_blank(caption);
        self
    }

    /// Append raw tag input; see [`normalize_tags`]
    pub fn tags<I, S>(mut self, raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags.extend(normalize_tags(raw));
        self
    }

    pub fn build(self) -> (AssetRecord, Vec<TagRecord>) {
        let tags = self
            .tags
            .into_iter()
            .map(|tag_name| TagRecord {
                asset_id: self.hash.clone(),
                tag_name,
            })
            .collect();

        let record = AssetRecord {
            id: self.hash,
            title: self.title,
            caption: self.caption,
            uploader: self.uploader,
        };

        (record, tags)
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
}
