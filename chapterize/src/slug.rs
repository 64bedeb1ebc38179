//! File-system safe names for sections

/// Slug used when a title has no letters or digits at all
pub const UNTITLED: &str = "untitled";

/// Hard and soft signs transliterate to quote marks, which would split words
fn is_silent(ch: char) -> bool {
    matches!(ch, 'ъ' | 'ь' | 'Ъ' | 'Ь' | '\'' | '"' | '’')
}

/// Turn a title into a lowercase ASCII slug
///
/// Transliteration and separator handling come from the `slug` crate;
/// the result is cut to at most `max_len` characters. A title with nothing
/// left yields an empty string.
pub fn slugify(title: &str, max_len: usize) -> String {
    let cleaned: String = title.chars().filter(|&ch| !is_silent(ch)).collect();
    truncate(&::slug::slugify(cleaned), max_len)
}

/// Cut to `max_len` characters without leaving a trailing separator
fn truncate(slug: &str, max_len: usize) -> String {
    match slug.char_indices().nth(max_len) {
        Some((cut, _)) => slug[..cut].trim_end_matches('-').to_string(),
        None => slug.to_string(),
    }
}

/// Slug of the first non-empty candidate, or [`UNTITLED`]
pub fn slug_or_untitled<'a>(candidates: impl IntoIterator<Item = &'a str>, max_len: usize) -> String {
    candidates
        .into_iter()
        .map(|c| slugify(c, max_len))
        .find(|s| !s.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string())
}

/// Append an ordinal suffix to disambiguate duplicate names
///
/// Returns `base` unchanged for the first occurrence.
pub fn disambiguate(base: &str, occurrence: usize) -> String {
    if occurrence <= 1 {
        base.to_string()
    } else {
        format!("{base}~{occurrence}")
    }
}
