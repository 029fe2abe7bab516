//! Hyperlink scanning over raw HTML or reader-mode Markdown.
//!
//! A single pattern matches both `href="…"` / `href='…'` attributes and
//! Markdown `[text](https://…)` links. This is a heuristic: malformed markup
//! (unquoted attributes, nested brackets in anchor text) is silently missed.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use siteprofiler_shared::{SiteLink, is_http_url, resolve_url};

use crate::title::last_segment;

/// Group 1: href value. Groups 2/3: Markdown anchor text and URL.
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"href=["'](.*?)["']|\[([^\]]+)\]\((https?://[^)]+)\)"#).expect("link regex")
});

/// Links containing any of these are never reported.
const EXCLUDED: &[&str] = &["facebook.com", "instagram.com", "waze.com", "mailto:"];

/// Title used when neither anchor text nor a path segment is available.
const FALLBACK_TITLE: &str = "Link";

/// Scan `content` for links not already in `known`.
///
/// At most `max_matches` pattern matches are examined, counting the ones
/// that end up discarded. Relative links are resolved against `base_url`.
pub fn extract_links(
    content: &str,
    base_url: &str,
    known: &HashSet<String>,
    max_matches: usize,
) -> Vec<SiteLink> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut links = Vec::new();

    for caps in LINK_RE.captures_iter(content).take(max_matches) {
        let raw = caps.get(1).or_else(|| caps.get(3)).map(|m| m.as_str());
        let Some(url) = resolve_url(raw, base_url) else {
            continue;
        };

        if !is_http_url(&url) || known.contains(&url) || seen.contains(&url) {
            continue;
        }
        if EXCLUDED.iter().any(|x| url.contains(x)) {
            continue;
        }

        let title = caps
            .get(2)
            .map(|m| m.as_str().trim().to_string())
            .filter(|t| !t.is_empty())
            .or_else(|| last_segment(&url).map(str::to_string))
            .unwrap_or_else(|| FALLBACK_TITLE.to_string());

        seen.insert(url.clone());
        links.push(SiteLink::new(title, url));
    }

    debug!(found = links.len(), "extracted links from content");
    links
}
