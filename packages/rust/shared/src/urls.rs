//! URL resolution and small string helpers shared by every pipeline stage.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Matches an RFC 3986 scheme prefix such as `https:` or `mailto:`.
static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").expect("scheme regex"));

/// True if `raw` starts with a URL scheme.
pub fn has_scheme(raw: &str) -> bool {
    SCHEME_RE.is_match(raw)
}

/// True if `raw` is an absolute `http://` or `https://` URL.
pub fn is_http_url(raw: &str) -> bool {
    let lower = raw.get(..8).unwrap_or(raw).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Resolve a possibly relative URL against `base`.
///
/// - empty or missing input yields `None`
/// - anything already carrying a scheme is returned as-is
/// - protocol-relative `//host/...` gets `https:`
/// - otherwise the input is joined onto `base` treated as a directory; a
///   leading `/` on the input is dropped so `base/` + `/x` becomes `base/x`
///
/// Never fails: if the join itself fails the trimmed input comes back.
pub fn resolve_url(raw: Option<&str>, base: &str) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }
    if has_scheme(trimmed) {
        return Some(trimmed.to_string());
    }
    if trimmed.starts_with("//") {
        return Some(format!("https:{trimmed}"));
    }

    let base_dir = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{base}/")
    };
    let relative = trimmed.strip_prefix('/').unwrap_or(trimmed);

    match Url::parse(&base_dir).and_then(|b| b.join(relative)) {
        Ok(resolved) => Some(resolved.to_string()),
        Err(e) => {
            tracing::debug!(
                url = trimmed,
                base,
                error = %e,
                "url resolution failed, keeping input"
            );
            Some(trimmed.to_string())
        }
    }
}

/// First `max_chars` characters of `content`, never splitting a code point.
pub fn truncate_chars(content: &str, max_chars: usize) -> &str {
    match content.char_indices().nth(max_chars) {
        Some((idx, _)) => &content[..idx],
        None => content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://site.com/shop/";

    #[test]
    fn absolute_url_passes_through() {
        let url = "https://cdn.example.com/a.png?x=1";
        assert_eq!(resolve_url(Some(url), BASE).as_deref(), Some(url));
    }

    #[test]
    fn protocol_relative_gets_https() {
        assert_eq!(
            resolve_url(Some("//cdn.example.com/x.png"), BASE).as_deref(),
            Some("https://cdn.example.com/x.png")
        );
        assert_eq!(
            resolve_url(Some("//cdn.example.com/x.png"), "http://other.org").as_deref(),
            Some("https://cdn.example.com/x.png")
        );
    }

    #[test]
    fn relative_resolves_against_base_directory() {
        assert_eq!(
            resolve_url(Some("images/a.png"), BASE).as_deref(),
            Some("https://site.com/shop/images/a.png")
        );
        assert_eq!(
            resolve_url(Some("images/a.png"), "https://site.com/shop").as_deref(),
            Some("https://site.com/shop/images/a.png")
        );
    }

    #[test]
    fn leading_slash_is_deduplicated_at_boundary() {
        assert_eq!(
            resolve_url(Some("/logo.svg"), "https://site.com").as_deref(),
            Some("https://site.com/logo.svg")
        );
        assert_eq!(
            resolve_url(Some("/logo.svg"), BASE).as_deref(),
            Some("https://site.com/shop/logo.svg")
        );
    }

    #[test]
    fn empty_input_is_none() {
        assert_eq!(resolve_url(None, BASE), None);
        assert_eq!(resolve_url(Some("   "), BASE), None);
    }

    #[test]
    fn unparseable_base_returns_trimmed_input() {
        assert_eq!(
            resolve_url(Some("  images/a.png "), "not a url").as_deref(),
            Some("images/a.png")
        );
    }

    #[test]
    fn other_schemes_pass_through() {
        assert_eq!(
            resolve_url(Some("mailto:hi@site.com"), BASE).as_deref(),
            Some("mailto:hi@site.com")
        );
        assert!(!is_http_url("mailto:hi@site.com"));
        assert!(is_http_url("HTTPS://site.com"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("שלום עולם", 4), "שלום");
        assert_eq!(truncate_chars("short", 100), "short");
        assert_eq!(truncate_chars("abc", 0), "");
    }
}
