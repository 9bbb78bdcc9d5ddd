//! URL-like substring extraction.

use std::sync::OnceLock;

use regex::Regex;

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // optional scheme or www., label run, .tld, optional path/query
        Regex::new(r"(?i)\b(?:https?://|www\.)?[a-z0-9.-]+\.[a-z]{2,}(?:/[\w./?%&=:#@!~+-]*)?")
            .expect("URL pattern is valid")
    })
}

/// Every URL-like substring of `text`, in order of appearance, duplicates kept.
/// Sentence punctuation directly after a URL is not part of it.
pub fn extract_urls(text: &str) -> Vec<&str> {
    url_regex()
        .find_iter(text)
        .map(|m| m.as_str().trim_end_matches(is_trailing_punctuation))
        .collect()
}

fn is_trailing_punctuation(c: char) -> bool {
    matches!(c, '.' | ',' | '!' | '?' | ')')
}
