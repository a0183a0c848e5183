//! Runs against a real Postgres when `LORIKEET_TEST_DATABASE_URL` is set;
//! otherwise each test returns immediately.

use lorikeet_core::{AssetRecord, ContentHash, PersistenceError, TagRecord};
use lorikeet_db::{run_migrations, AssetRepository, PgAssetRepository};
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

async fn repository() -> Option<PgAssetRepository> {
    let url = std::env::var("LORIKEET_TEST_DATABASE_URL").ok()?;
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&url)
        .await
        .expect("Failed to connect to test database");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    Some(PgAssetRepository::new(pool))
}

fn unique_record(label: &str) -> AssetRecord {
    let seed = format!("{}-{}", label, chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0));
    AssetRecord {
        id: ContentHash::of_bytes(seed.as_bytes()),
        title: Some(label.to_string()),
        caption: None,
        uploader: "integration".to_string(),
    }
}

#[tokio::test]
async fn test_insert_list_delete() {
    let Some(repo) = repository().await else {
        return;
    };
    let asset = unique_record("pg-roundtrip");
    let tags: Vec<TagRecord> = ["parrot", "parrot", "green"]
        .iter()
        .map(|t| TagRecord {
            asset_id: asset.id.clone(),
            tag_name: t.to_string(),
        })
        .collect();

    let stored = repo.insert_asset(&asset, &tags).await.unwrap();
    assert_eq!(stored.title.as_deref(), Some("pg-roundtrip"));
    assert!(repo.exists(&asset.id).await.unwrap());

    let tag_rows = repo.tags_for(&asset.id).await.unwrap();
    assert_eq!(tag_rows.len(), 2);

    let listed = repo.list_with_tags().await.unwrap();
    let summary = listed
        .iter()
        .find(|s| s.asset.id == asset.id)
        .expect("inserted asset is listed");
    assert_eq!(summary.tags.as_deref(), Some("parrot,green"));

    let err = repo.insert_asset(&asset, &[]).await.unwrap_err();
    assert!(matches!(err, PersistenceError::Duplicate(_)));

    assert!(repo.delete(&asset.id).await.unwrap());
    assert!(repo.tags_for(&asset.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_oversized_tag_rolls_back_asset() {
    let Some(repo) = repository().await else {
        return;
    };
    let asset = unique_record("pg-rollback");
    let tags = vec![TagRecord {
        asset_id: asset.id.clone(),
        tag_name: "x".repeat(65),
    }];

    let err = repo.insert_asset(&asset, &tags).await.unwrap_err();
    assert!(matches!(err, PersistenceError::Constraint(_)));
    assert!(!repo.exists(&asset.id).await.unwrap());
}
