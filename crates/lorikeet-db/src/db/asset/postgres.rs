use async_trait::async_trait;
use lorikeet_core::{
    Asset, AssetRecord, AssetSummary, ContentHash, PersistenceError, Tag, TagRecord,
};
use sqlx::{PgPool, Postgres};

use super::repository::{check_tag_owners, AssetRepository};
use crate::db::transaction::TransactionGuard;

/// Repository for image assets backed by Postgres
#[derive(Clone)]
pub struct PgAssetRepository {
    pool: PgPool,
}

impl PgAssetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl AssetRepository for PgAssetRepository {
    #[tracing::instrument(skip(self), fields(db.table = "lorikeet_images", db.operation = "select", db.record_id = %id))]
    async fn exists(&self, id: &ContentHash) -> Result<bool, PersistenceError> {
        let exists = sqlx::query_scalar::<Postgres, bool>(
            "SELECT EXISTS(SELECT 1 FROM lorikeet_images WHERE image_id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    #[tracing::instrument(skip(self, asset, tags), fields(db.table = "lorikeet_images", db.operation = "insert", db.record_id = %asset.id, tag_count = tags.len()))]
    async fn insert_asset(
        &self,
        asset: &AssetRecord,
        tags: &[TagRecord],
    ) -> Result<Asset, PersistenceError> {
        check_tag_owners(asset, tags)?;

        let mut tx = TransactionGuard::begin(&self.pool).await?;

        let inserted = sqlx::query_as::<Postgres, Asset>(
            r#"
            INSERT INTO lorikeet_images (image_id, image_title, image_caption, uploader)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (image_id) DO NOTHING
            RETURNING image_id, image_title, image_caption, uploader, uploaded, edited
            "#,
        )
        .bind(&asset.id)
        .bind(&asset.title)
        .bind(&asset.caption)
        .bind(&asset.uploader)
        .fetch_optional(&mut **tx)
        .await;

        let inserted = match inserted {
            Ok(Some(row)) => row,
            Ok(None) => {
                tx.rollback().await?;
                return Err(PersistenceError::Duplicate(asset.id.to_string()));
            }
            Err(e) => {
                tx.rollback().await?;
                return Err(e.into());
            }
        };

        for tag in tags {
            let result = sqlx::query(
                r#"
                INSERT INTO lorikeet_tags (image_id, tag_name)
                VALUES ($1, $2)
                ON CONFLICT (image_id, tag_name) DO NOTHING
                "#,
            )
            .bind(&tag.asset_id)
            .bind(&tag.tag_name)
            .execute(&mut **tx)
            .await;

            if let Err(e) = result {
                tx.rollback().await?;
                return Err(e.into());
            }
        }

        tx.commit().await?;

        tracing::debug!(
            image_id = %inserted.id,
            tags = tags.len(),
            "Asset recorded"
        );

        Ok(inserted)
    }

    #[tracing::instrument(skip(self), fields(db.table = "lorikeet_images", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: &ContentHash) -> Result<Option<Asset>, PersistenceError> {
        let asset = sqlx::query_as::<Postgres, Asset>(
            r#"
            SELECT image_id, image_title, image_caption, uploader, uploaded, edited
            FROM lorikeet_images
            WHERE image_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(asset)
    }

    #[tracing::instrument(skip(self), fields(db.table = "lorikeet_images", db.operation = "select"))]
    async fn list_with_tags(&self) -> Result<Vec<AssetSummary>, PersistenceError> {
        let summaries = sqlx::query_as::<Postgres, AssetSummary>(
            r#"
            SELECT i.image_id, i.image_title, i.image_caption, i.uploader, i.uploaded, i.edited,
                   string_agg(t.tag_name, ',' ORDER BY t.tag_id) AS tags
            FROM lorikeet_images i
            LEFT JOIN lorikeet_tags t ON t.image_id = i.image_id
            GROUP BY i.image_id
            ORDER BY i.image_title ASC NULLS FIRST, i.image_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(summaries)
    }

    #[tracing::instrument(skip(self), fields(db.table = "lorikeet_tags", db.operation = "select", db.record_id = %id))]
    async fn tags_for(&self, id: &ContentHash) -> Result<Vec<Tag>, PersistenceError> {
        let tags = sqlx::query_as::<Postgres, Tag>(
            "SELECT tag_id, image_id, tag_name FROM lorikeet_tags WHERE image_id = $1 ORDER BY tag_id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tags)
    }

    #[tracing::instrument(skip(self), fields(db.table = "lorikeet_images", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, id: &ContentHash) -> Result<bool, PersistenceError> {
        // Tags go with the row (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM lorikeet_images WHERE image_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
