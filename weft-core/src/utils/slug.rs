use once_cell::sync::Lazy;
use regex::Regex;

static SLUG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9]+").expect("Failed to compile slug regex"));

/// Normalize text into a URL-friendly slug
pub fn slugify(text: &str) -> String {
    let lowered = text.trim().to_lowercase();

    SLUG_REGEX
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}
