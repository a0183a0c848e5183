//! Tag normalization

/// Turn raw tag input into clean tag names.
///
/// Accepts anything iterable over strings: `Some("a, b")` for a single
/// comma-separated field, a `Vec` of fields, or `None` for no tags. Each
/// element is split on `,`, trimmed, and empty pieces are dropped. Order is
/// preserved and repeats are kept.
pub fn normalize_tags<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .flat_map(|field| {
            field
                .as_ref()
                .split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}
