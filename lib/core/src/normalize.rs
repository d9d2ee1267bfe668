/// Canonicalize a text field for matching and feature extraction.
///
/// Lower-cases the input and drops every character that is neither
/// alphanumeric nor whitespace. Runs of whitespace are kept as-is.
///
/// `_` is punctuation here and is dropped. The index tokenizer instead treats
/// it as a word character, which only matters for the raw publisher field.
#[inline]
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect()
}

/// Same as [`normalize`] for optional fields; missing maps to empty.
#[inline]
pub fn normalize_opt(text: Option<&str>) -> String {
    text.map(normalize).unwrap_or_default()
}
