use async_trait::async_trait;
use lorikeet_core::{
    Asset, AssetRecord, AssetSummary, ContentHash, PersistenceError, Tag, TagRecord,
};

/// Persistence of image assets and their tags
///
/// Implemented by [`super::PgAssetRepository`] for production and
/// [`super::MemoryAssetRepository`] for tests and database-less runs. Both
/// enforce the same column widths and uniqueness rules.
#[async_trait]
pub trait AssetRepository: Send + Sync {
    /// Whether an asset with this content hash is already recorded
    async fn exists(&self, id: &ContentHash) -> Result<bool, PersistenceError>;

    /// Insert an asset row together with its tags as one atomic unit.
    ///
    /// Returns [`PersistenceError::Duplicate`] when the id is already taken.
    /// Repeated tag names for the same asset are stored once.
    async fn insert_asset(
        &self,
        asset: &AssetRecord,
        tags: &[TagRecord],
    ) -> Result<Asset, PersistenceError>;

    async fn get(&self, id: &ContentHash) -> Result<Option<Asset>, PersistenceError>;

    /// Every asset with its tags joined by `,`, ordered by title ascending
    /// (untitled first, ties broken by id).
    async fn list_with_tags(&self) -> Result<Vec<AssetSummary>, PersistenceError>;

    /// Tags of one asset in insertion order
    async fn tags_for(&self, id: &ContentHash) -> Result<Vec<Tag>, PersistenceError>;

    /// Remove an asset and its tags. Returns whether a row was removed.
    async fn delete(&self, id: &ContentHash) -> Result<bool, PersistenceError>;
}

/// Reject tag records that point at a different asset than the one being
/// inserted.
pub(crate) fn check_tag_owners(
    asset: &AssetRecord,
    tags: &[TagRecord],
) -> Result<(), PersistenceError> {
    match tags.iter().find(|t| t.asset_id != asset.id) {
        Some(stray) => Err(PersistenceError::InvalidRecord(format!(
            "tag '{}' belongs to {} but is being inserted with {}",
            stray.tag_name, stray.asset_id, asset.id
        ))),
        None => Ok(()),
    }
}
