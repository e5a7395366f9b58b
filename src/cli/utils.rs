//! Shared CLI utilities.

/// Split a comma-separated string, trimming whitespace and discarding empty
/// segments.
pub fn split_csv(value: &str) -> Vec<String> {
    value.split(',').map(str::trim).filter(|part| !part.is_empty()).map(str::to_string).collect()
}

/// [`split_csv`] over an optional flag value. Returns `None` when `value` is `None`.
pub fn parse_csv(value: &Option<String>) -> Option<Vec<String>> {
    value.as_deref().map(split_csv)
}
