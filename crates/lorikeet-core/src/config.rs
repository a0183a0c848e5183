//! Configuration module
//!
//! Ingest settings are an immutable [`IngestConfig`] value handed to every
//! pipeline call. [`Config`] wraps it together with the database settings the
//! binaries need.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};

use crate::constants::BYTES_PER_MB;

// Common constants
const MAX_CONNECTIONS: u32 = 5;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const THUMBNAIL_MAX_DIMENSION: u32 = 250;
const MAX_FILESIZE_MB: u64 = 2;
const OUTPUT_QUALITY: f32 = 80.0;
const ASSET_DIRECTORY: &str = "./lorikeet";

/// Encoding every derived image is normalised to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    WebP,
    Png,
    Jpeg,
}

impl OutputFormat {
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "webp" => Ok(OutputFormat::WebP),
            "png" => Ok(OutputFormat::Png),
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            _ => Err(anyhow!("Invalid output format: {}", s)),
        }
    }

    /// File extension used for stored files
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::WebP => "webp",
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }

    pub fn to_mime_type(self) -> &'static str {
        match self {
            OutputFormat::WebP => "image/webp",
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OutputFormat::parse(s)
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.extension())
    }
}

/// Settings for one run of the upload-and-derive pipeline.
///
/// A maximum dimension of `0` means "no limit" on that axis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub max_width: u32,
    pub max_height: u32,
    pub thumbnail_max_width: u32,
    pub thumbnail_max_height: u32,
    pub max_filesize_mb: u64,
    pub output_format: OutputFormat,
    /// Encoder quality, 0-100. Ignored by lossless formats.
    pub output_quality: f32,
    pub asset_directory: PathBuf,
    /// Reserved for a scanning integration; never read by the pipeline.
    pub virus_total_api_key: Option<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_width: 0,
            max_height: 0,
            thumbnail_max_width: THUMBNAIL_MAX_DIMENSION,
            thumbnail_max_height: THUMBNAIL_MAX_DIMENSION,
            max_filesize_mb: MAX_FILESIZE_MB,
            output_format: OutputFormat::default(),
            output_quality: OUTPUT_QUALITY,
            asset_directory: PathBuf::from(ASSET_DIRECTORY),
            virus_total_api_key: None,
        }
    }
}

impl IngestConfig {
    /// Upload size cap in bytes (inclusive)
    pub fn max_filesize_bytes(&self) -> u64 {
        self.max_filesize_mb.saturating_mul(BYTES_PER_MB)
    }

    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source; absent keys take defaults,
    /// malformed values are rejected.
    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            max_width: parse_or(&get, "LORIKEET_MAX_WIDTH", defaults.max_width)?,
            max_height: parse_or(&get, "LORIKEET_MAX_HEIGHT", defaults.max_height)?,
            thumbnail_max_width: parse_or(
                &get,
                "LORIKEET_THUMBNAIL_MAX_WIDTH",
                defaults.thumbnail_max_width,
            )?,
            thumbnail_max_height: parse_or(
                &get,
                "LORIKEET_THUMBNAIL_MAX_HEIGHT",
                defaults.thumbnail_max_height,
            )?,
            max_filesize_mb: parse_or(&get, "LORIKEET_MAX_FILESIZE_MB", defaults.max_filesize_mb)?,
            output_format: parse_or(&get, "LORIKEET_OUTPUT_FORMAT", defaults.output_format)?,
            output_quality: parse_or(&get, "LORIKEET_OUTPUT_QUALITY", defaults.output_quality)?,
            asset_directory: get("LORIKEET_ASSET_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.asset_directory),
            virus_total_api_key: get("LORIKEET_VIRUS_TOTAL_API_KEY").filter(|k| !k.is_empty()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_filesize_mb == 0 {
            return Err(anyhow!("LORIKEET_MAX_FILESIZE_MB must be greater than zero"));
        }

        if !(0.0..=100.0).contains(&self.output_quality) {
            return Err(anyhow!(
                "LORIKEET_OUTPUT_QUALITY must be between 0 and 100 (got {})",
                self.output_quality
            ));
        }

        if self.asset_directory.as_os_str().is_empty() {
            return Err(anyhow!("LORIKEET_ASSET_DIR must not be empty"));
        }

        Ok(())
    }
}

/// Application configuration (database + ingest settings).
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub environment: String,
    pub ingest: IngestConfig,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = get("LORIKEET_DATABASE_URL")
            .or_else(|| get("DATABASE_URL"))
            .ok_or_else(|| anyhow!("LORIKEET_DATABASE_URL or DATABASE_URL must be set"))?;

        let config = Self {
            database_url,
            db_max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", MAX_CONNECTIONS)?,
            db_timeout_seconds: parse_or(&get, "DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS)?,
            environment: get("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            ingest: IngestConfig::from_lookup(&get)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.database_url.starts_with("postgres://")
            || self.database_url.starts_with("postgresql://"))
        {
            return Err(anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.db_max_connections == 0 {
            return Err(anyhow!("DB_MAX_CONNECTIONS must be greater than zero"));
        }

        self.ingest.validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}

fn parse_or<T, F>(get: &F, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("{}", e))
            .with_context(|| format!("{} has an invalid value: {:?}", key, raw)),
        _ => Ok(default),
    }
}
