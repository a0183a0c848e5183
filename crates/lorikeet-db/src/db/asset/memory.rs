use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use lorikeet_core::constants::{
    MAX_CAPTION_LENGTH, MAX_TAG_LENGTH, MAX_TITLE_LENGTH, MAX_UPLOADER_LENGTH,
};
use lorikeet_core::{
    Asset, AssetRecord, AssetSummary, ContentHash, PersistenceError, Tag, TagRecord,
};

use super::repository::{check_tag_owners, AssetRepository};

#[derive(Default)]
struct State {
    assets: HashMap<ContentHash, Asset>,
    tags: Vec<Tag>,
    next_tag_id: i64,
}

/// In-memory asset repository
///
/// Applies the same column widths and uniqueness rules as the Postgres
/// schema so that tests exercise realistic failures.
#[derive(Clone, Default)]
pub struct MemoryAssetRepository {
    state: Arc<Mutex<State>>,
}

impl MemoryAssetRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // A panic while holding the lock cannot leave State half-updated:
        // every mutation happens after all checks pass.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn asset_count(&self) -> usize {
        self.state().assets.len()
    }

    pub fn tag_count(&self) -> usize {
        self.state().tags.len()
    }
}

fn check_length(column: &str, value: &str, max: usize) -> Result<(), PersistenceError> {
    let len = value.chars().count();
    if len > max {
        return Err(PersistenceError::Constraint(format!(
            "value too long for {} ({} > {} characters)",
            column, len, max
        )));
    }
    Ok(())
}

fn check_record(asset: &AssetRecord, tags: &[TagRecord]) -> Result<(), PersistenceError> {
    if let Some(title) = &asset.title {
        check_length("image_title", title, MAX_TITLE_LENGTH)?;
    }
    if let Some(caption) = &asset.caption {
        check_length("image_caption", caption, MAX_CAPTION_LENGTH)?;
    }
    check_length("uploader", &asset.uploader, MAX_UPLOADER_LENGTH)?;
    for tag in tags {
        check_length("tag_name", &tag.tag_name, MAX_TAG_LENGTH)?;
    }
    Ok(())
}

#[async_trait]
impl AssetRepository for MemoryAssetRepository {
    async fn exists(&self, id: &ContentHash) -> Result<bool, PersistenceError> {
        Ok(self.state().assets.contains_key(id))
    }

    async fn insert_asset(
        &self,
        asset: &AssetRecord,
        tags: &[TagRecord],
    ) -> Result<Asset, PersistenceError> {
        check_tag_owners(asset, tags)?;
        check_record(asset, tags)?;

        let mut state = self.state();
        if state.assets.contains_key(&asset.id) {
            return Err(PersistenceError::Duplicate(asset.id.to_string()));
        }

        let now = Utc::now();
        let stored = Asset {
            id: asset.id.clone(),
            title: asset.title.clone(),
            caption: asset.caption.clone(),
            uploader: asset.uploader.clone(),
            uploaded_at: now,
            edited_at: now,
        };
        state.assets.insert(asset.id.clone(), stored.clone());

        for tag in tags {
            let already = state
                .tags
                .iter()
                .any(|t| t.asset_id == tag.asset_id && t.tag_name == tag.tag_name);
            if already {
                continue;
            }
            state.next_tag_id += 1;
            let id = state.next_tag_id;
            state.tags.push(Tag {
                id,
                asset_id: tag.asset_id.clone(),
                tag_name: tag.tag_name.clone(),
            });
        }

        Ok(stored)
    }

    async fn get(&self, id: &ContentHash) -> Result<Option<Asset>, PersistenceError> {
        Ok(self.state().assets.get(id).cloned())
    }

    async fn list_with_tags(&self) -> Result<Vec<AssetSummary>, PersistenceError> {
        let state = self.state();

        let mut summaries: Vec<AssetSummary> = state
            .assets
            .values()
            .map(|asset| {
                let names: Vec<&str> = state
                    .tags
                    .iter()
                    .filter(|t| t.asset_id == asset.id)
                    .map(|t| t.tag_name.as_str())
                    .collect();
                AssetSummary {
                    asset: asset.clone(),
                    tags: if names.is_empty() {
                        None
                    } else {
                        Some(names.join(","))
                    },
                }
            })
            .collect();

        // None sorts before Some, matching NULLS FIRST
        summaries.sort_by(|a, b| {
            a.asset
                .title
                .cmp(&b.asset.title)
                .then_with(|| a.asset.id.cmp(&b.asset.id))
        });

        Ok(summaries)
    }

    async fn tags_for(&self, id: &ContentHash) -> Result<Vec<Tag>, PersistenceError> {
        Ok(self
            .state()
            .tags
            .iter()
            .filter(|t| &t.asset_id == id)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: &ContentHash) -> Result<bool, PersistenceError> {
        let mut state = self.state();
        let removed = state.assets.remove(id).is_some();
        state.tags.retain(|t| &t.asset_id != id);
        Ok(removed)
    }
}
