//! Column limits, filename suffixes and size units shared across crates.

/// Column widths from the schema (characters).
pub const MAX_TITLE_LENGTH: usize = 128;
pub const MAX_CAPTION_LENGTH: usize = 1024;
pub const MAX_UPLOADER_LENGTH: usize = 400;
pub const MAX_TAG_LENGTH: usize = 64;

/// Filename suffix of the thumbnail variant.
pub const THUMBNAIL_SUFFIX: &str = "_thumb";

/// Subdirectory of the asset directory that holds in-flight uploads.
pub const STAGING_DIR_NAME: &str = ".staging";

pub const BYTES_PER_MB: u64 = 1024 * 1024;
