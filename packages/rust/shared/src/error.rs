//! Error types for siteprofiler.
//!
//! Library crates use [`SiteProfilerError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Message shown to the user whenever automatic analysis gives up.
pub const SITE_UNREADABLE_MESSAGE: &str = "could not read the site automatically; it may be \
     blocking automated access. Please fill in the details manually.";

/// Why a user-supplied site address was rejected before any network activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRejection {
    /// Nothing but whitespace was entered.
    Empty,
    /// The input is made of digits, dashes, spaces and `+` only.
    PhoneNumber,
    /// No `.` anywhere in the input (and it is not `localhost`).
    MissingSuffix,
    /// The input does not parse as a URL, or its host has no `.`.
    InvalidHostname,
}

impl std::fmt::Display for InputRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            Self::Empty => "no website address was entered",
            Self::PhoneNumber => {
                "this looks like a phone number; enter a website address (e.g. example.co.il)"
            }
            Self::MissingSuffix => {
                "the website address is missing a domain suffix (such as .co.il or .com)"
            }
            Self::InvalidHostname => "the website address is not valid; check it and try again",
        };
        f.write_str(msg)
    }
}

/// Top-level error type for all siteprofiler operations.
#[derive(Debug, thiserror::Error)]
pub enum SiteProfilerError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error on a single request.
    #[error("network error: {0}")]
    Network(String),

    /// Data validation error (bad config value, unexpected shape, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The user-supplied site address was rejected.
    #[error("invalid input: {0}")]
    InvalidInput(InputRejection),

    /// Every relay strategy failed for one target.
    #[error("all {attempts} fetch strategies failed for {target}")]
    FetchExhausted { target: String, attempts: usize },

    /// No usable content could be assembled, or extraction failed.
    ///
    /// The display text is the fixed user-facing message; `reason` is for logs.
    #[error("{}", SITE_UNREADABLE_MESSAGE)]
    SiteUnreadable { reason: String },

    /// The structured-extraction response was not valid JSON.
    #[error("model response malformed: {0}")]
    ModelResponseMalformed(String),

    /// Structured-extraction service error (transport, API status, empty answer).
    #[error("model error: {0}")]
    Model(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SiteProfilerError>;

impl SiteProfilerError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a site-unreadable error carrying an internal reason.
    pub fn unreadable(reason: impl Into<String>) -> Self {
        Self::SiteUnreadable {
            reason: reason.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the caller should switch to manual entry.
    pub fn is_site_unreadable(&self) -> bool {
        matches!(self, Self::SiteUnreadable { .. })
    }
}
