//! Lorikeet CLI: ingest and inspect image assets.
//!
//! Reads configuration from the environment (and `.env`): LORIKEET_DATABASE_URL
//! (or DATABASE_URL), LORIKEET_ASSET_DIR, LORIKEET_MAX_WIDTH and friends.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use lorikeet_cli::{init_tracing, summary_table};
use lorikeet_core::{Config, ContentHash, ErrorMetadata, UploadDescriptor};
use lorikeet_db::{setup_database, PgAssetRepository};
use lorikeet_services::{AssetService, UploadMetadata};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "lorikeet", about = "Lorikeet image asset CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Ingest an image file
    Upload {
        /// Path to the image
        file: PathBuf,
        /// Name recorded as the uploader
        #[arg(long, default_value = "lorikeet")]
        uploader: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        caption: Option<String>,
        /// Tags; repeat the flag or separate with commas
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Show one asset and its tags
    Get {
        /// Content hash (64 hex characters)
        id: String,
    },
    /// List all assets ordered by title
    List {
        /// Output format: json or table
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Write an asset's display image (or thumbnail) to a file or stdout
    Serve {
        /// Content hash (64 hex characters)
        id: String,
        #[arg(long)]
        thumbnail: bool,
        /// Destination file; raw bytes go to stdout when omitted
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

fn parse_hash(id: &str) -> anyhow::Result<ContentHash> {
    ContentHash::parse(id).map_err(|e| anyhow::anyhow!(e))
}

async fn service(config: &Config) -> anyhow::Result<AssetService> {
    let pool = setup_database(config).await?;
    let repository = Arc::new(PgAssetRepository::new(pool));
    AssetService::local(config.ingest.clone(), repository)
        .await
        .context("Failed to open asset directory")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let config = Config::from_env().context(
        "Failed to load configuration. Set LORIKEET_DATABASE_URL (or DATABASE_URL)",
    )?;

    match cli.command {
        Commands::Migrate => {
            // Connecting applies any pending migrations
            setup_database(&config).await?;
            tracing::info!(environment = %config.environment, "Migrations up to date");
            print_json(&serde_json::json!({ "migrated": true }))?;
        }
        Commands::Upload {
            file,
            uploader,
            title,
            caption,
            tags,
        } => {
            let service = service(&config).await?;
            let upload = UploadDescriptor::from_path(file);
            let metadata = UploadMetadata {
                uploader,
                title,
                caption,
                tags,
            };

            match service.upload(&upload, &metadata).await {
                Ok(hash) => print_json(&serde_json::json!({ "image_id": hash }))?,
                Err(err) => {
                    print_json(&serde_json::json!({
                        "error": err.error_code(),
                        "message": err.to_string(),
                    }))?;
                    return Err(err).context("Upload failed");
                }
            }
        }
        Commands::Get { id } => {
            let hash = parse_hash(&id)?;
            let service = service(&config).await?;
            let asset = service
                .get_by_id(&hash)
                .await?
                .with_context(|| format!("Image {} not found", hash))?;
            let tags: Vec<String> = service
                .tags(&hash)
                .await?
                .into_iter()
                .map(|t| t.tag_name)
                .collect();
            print_json(&serde_json::json!({ "image": asset, "tags": tags }))?;
        }
        Commands::List { format } => {
            let service = service(&config).await?;
            let list = service.list_all().await?;
            match format.as_str() {
                "json" => print_json(&list)?,
                "table" => print!("{}", summary_table(&list)),
                other => anyhow::bail!("Invalid format '{}'. Must be: json or table", other),
            }
        }
        Commands::Serve {
            id,
            thumbnail,
            output,
        } => {
            let hash = parse_hash(&id)?;
            let service = service(&config).await?;
            let image = service
                .serve(&hash, thumbnail)
                .await?
                .with_context(|| format!("Image {} not found", hash))?;

            match output {
                Some(path) => {
                    tokio::fs::write(&path, &image.bytes)
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    print_json(&serde_json::json!({
                        "content_type": image.content_type,
                        "size_bytes": image.len(),
                        "path": path,
                    }))?;
                }
                None => {
                    let mut stdout = std::io::stdout().lock();
                    stdout.write_all(&image.bytes)?;
                    stdout.flush()?;
                }
            }
        }
    }

    Ok(())
}
