//! Inline reference-marker extraction
//!
//! Material and electronic-resource titles may embed a single inline marker
//! of the fixed form `<ref>TOKEN</ref>`. Extraction is a single-pass regex
//! scan, not a markup parser; the marker grammar is a fixed, narrow subset.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref RE_REF_MARKER: Regex = Regex::new(r"<ref>\s*([^<]*?)\s*</ref>").unwrap();
    static ref RE_WHITESPACE: Regex = Regex::new(r"\s{2,}").unwrap();
}

/// Extract the first reference marker from a title.
///
/// Returns the marker token (if any) and the title with the marker removed
/// and surrounding whitespace collapsed.
pub fn extract_reference_marker(title: &str) -> (Option<String>, String) {
    let marker = RE_REF_MARKER
        .captures(title)
        .map(|caps| caps[1].to_string())
        .filter(|m| !m.is_empty());

    let cleaned = RE_REF_MARKER.replace_all(title, " ");
    let cleaned = RE_WHITESPACE.replace_all(&cleaned, " ");

    (marker, cleaned.trim().to_string())
}
