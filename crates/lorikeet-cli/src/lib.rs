use lorikeet_core::AssetSummary;
use tracing_subscriber::EnvFilter;

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Render the asset list as a fixed-width table
pub fn summary_table(list: &[AssetSummary]) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n=== Images ({}) ===\n", list.len()));

    if list.is_empty() {
        out.push_str("\nNo images found.\n");
        return out;
    }

    out.push_str(&format!(
        "\n{:<64} {:<30} {:<16} {:<30} {:>20}\n",
        "ID", "Title", "Uploader", "Tags", "Uploaded At"
    ));
    out.push_str(&"-".repeat(164));
    out.push('\n');

    for item in list {
        out.push_str(&format!(
            "{:<64} {:<30} {:<16} {:<30} {:>20}\n",
            item.asset.id,
            truncate_string(item.asset.title.as_deref().unwrap_or("(untitled)"), 30),
            truncate_string(&item.asset.uploader, 16),
            truncate_string(item.tags.as_deref().unwrap_or(""), 30),
            item.asset.uploaded_at.format("%Y-%m-%d %H:%M:%S")
        ));
    }

    out
}

/// Filter used when `RUST_LOG` is unset or invalid
pub const DEFAULT_LOG_FILTER: &str = "lorikeet=info";

/// Filter from the given `RUST_LOG` directives, falling back to
/// [`DEFAULT_LOG_FILTER`].
pub fn env_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Initialize tracing for CLI binaries.
///
/// `LOG_FORMAT=json` switches to JSON lines. Logs go to stderr so stdout
/// stays machine-readable.
pub fn init_tracing() {
    let filter = env_filter(std::env::var("RUST_LOG").ok().as_deref());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
