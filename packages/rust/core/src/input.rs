//! Validation of the site address typed by the user.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use siteprofiler_shared::{InputRejection, Result, SiteProfilerError};

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d\-\s+]+$").expect("phone regex"));

static HTTP_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^https?://").expect("scheme regex"));

/// Minimum digit count for an input to be treated as a phone number.
const PHONE_MIN_DIGITS: usize = 7;

/// Normalize user input into an absolute site URL.
///
/// Bare hosts get an `https://` prefix. Phone numbers, suffix-less names and
/// unparsable addresses are rejected before any network activity.
pub fn validate_site_input(raw: &str) -> Result<String> {
    let clean = raw.trim();
    if clean.is_empty() {
        return Err(reject(InputRejection::Empty));
    }

    if PHONE_RE.is_match(clean)
        && clean.chars().filter(|c| c.is_ascii_digit()).count() >= PHONE_MIN_DIGITS
    {
        return Err(reject(InputRejection::PhoneNumber));
    }

    if !clean.contains('.') && !is_localhost(clean) {
        return Err(reject(InputRejection::MissingSuffix));
    }

    let with_scheme = if HTTP_PREFIX_RE.is_match(clean) {
        clean.to_string()
    } else {
        format!("https://{clean}")
    };

    let parsed = Url::parse(&with_scheme).map_err(|_| reject(InputRejection::InvalidHostname))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| reject(InputRejection::InvalidHostname))?;
    if !host.contains('.') && !is_localhost(host) {
        return Err(reject(InputRejection::InvalidHostname));
    }

    Ok(with_scheme)
}

fn is_localhost(s: &str) -> bool {
    s.eq_ignore_ascii_case("localhost")
}

fn reject(why: InputRejection) -> SiteProfilerError {
    SiteProfilerError::InvalidInput(why)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejection(raw: &str) -> InputRejection {
        match validate_site_input(raw) {
            Err(SiteProfilerError::InvalidInput(why)) => why,
            other => panic!("expected rejection for {raw:?}, got {other:?}"),
        }
    }

    #[test]
    fn bare_host_gets_https() {
        assert_eq!(validate_site_input("example.co.il").unwrap(), "https://example.co.il");
        assert_eq!(validate_site_input("  acme.com/shop ").unwrap(), "https://acme.com/shop");
    }

    #[test]
    fn existing_scheme_is_kept() {
        assert_eq!(validate_site_input("http://acme.com").unwrap(), "http://acme.com");
        assert_eq!(validate_site_input("HTTPS://Acme.com").unwrap(), "HTTPS://Acme.com");
    }

    #[test]
    fn localhost_is_allowed() {
        assert_eq!(validate_site_input("localhost").unwrap(), "https://localhost");
    }

    #[test]
    fn empty_input() {
        assert_eq!(rejection(""), InputRejection::Empty);
        assert_eq!(rejection("   "), InputRejection::Empty);
    }

    #[test]
    fn phone_numbers() {
        assert_eq!(rejection("050-1234567"), InputRejection::PhoneNumber);
        assert_eq!(rejection("+972 50 123 4567"), InputRejection::PhoneNumber);
    }

    #[test]
    fn short_digit_runs_are_not_phones() {
        // Too few digits for a phone, and no suffix either.
        assert_eq!(rejection("12-34"), InputRejection::MissingSuffix);
    }

    #[test]
    fn missing_suffix() {
        assert_eq!(rejection("mybusiness"), InputRejection::MissingSuffix);
    }

    #[test]
    fn invalid_hostname() {
        assert_eq!(rejection("https://intranet/path.html"), InputRejection::InvalidHostname);
        assert_eq!(rejection("exa mple.com"), InputRejection::InvalidHostname);
    }
}
