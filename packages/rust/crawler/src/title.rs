//! Human-readable titles derived from URLs.

use std::sync::LazyLock;

use regex::Regex;

/// Page-like file extensions stripped from the final path segment.
static PAGE_EXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(html?|php|aspx?|jsp)$").expect("extension regex"));

/// Last non-empty path segment of `url`, ignoring query and fragment.
pub fn last_segment(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.split('/').filter(|s| !s.is_empty()).next_back()
}

/// Turn a URL into a title: `/products/blue_wool-hat.html` → `Blue Wool Hat`.
pub fn title_from_url(url: &str) -> String {
    let Some(segment) = last_segment(url) else {
        return url.to_string();
    };

    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    let stem = PAGE_EXT_RE.replace(&decoded, "");
    let spaced = stem.replace(['-', '_'], " ");

    title_case(spaced.trim())
}

/// Upper-case the first letter of every word.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        let is_word = c.is_alphanumeric();
        if is_word && !in_word {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        in_word = is_word;
    }
    out
}
