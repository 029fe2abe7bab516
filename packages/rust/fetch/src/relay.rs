//! Ordered relay fallback chain.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument, warn};

use siteprofiler_shared::{FetchConfig, RelayConfig, Result, SiteProfilerError};

use crate::TextSource;

/// User-Agent string for relay requests.
const USER_AGENT: &str = concat!("siteprofiler/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects to follow per attempt.
const MAX_REDIRECTS: usize = 5;

// ---------------------------------------------------------------------------
// ResilientFetcher
// ---------------------------------------------------------------------------

/// Fetches a target's body through each configured relay in turn.
///
/// The order is fixed. A relay fails on a transport error, a non-2xx status,
/// an oversize body, or a body shorter than `min_body_chars`; the first relay
/// that succeeds wins and no relay is retried.
#[derive(Clone)]
pub struct ResilientFetcher {
    client: Client,
    relays: Vec<RelayConfig>,
    min_body_chars: usize,
    max_response_bytes: u64,
}

impl ResilientFetcher {
    /// Create a fetcher with a per-attempt timeout taken from `config`.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                SiteProfilerError::Network(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            relays: config.relays.clone(),
            min_body_chars: config.min_body_chars,
            max_response_bytes: config.max_response_bytes,
        })
    }

    /// Fetch `target` through the relay chain.
    #[instrument(skip(self), fields(relays = self.relays.len()))]
    pub async fn fetch(&self, target: &str) -> Result<String> {
        let ts = chrono::Utc::now().timestamp_millis();

        for relay in &self.relays {
            let url = relay_url(&relay.template, target, ts);
            match self.attempt(&url).await {
                Ok(body) => {
                    debug!(relay = %relay.name, chars = body.len(), "relay succeeded");
                    return Ok(body);
                }
                Err(e) => {
                    warn!(relay = %relay.name, error = %e, "relay strategy failed, trying next");
                }
            }
        }

        Err(SiteProfilerError::FetchExhausted {
            target: target.to_string(),
            attempts: self.relays.len(),
        })
    }

    /// One GET with the shared success criteria.
    ///
    /// Every rejection is a `Network` error so the chain can move on.
    pub(crate) async fn attempt(&self, url: &str) -> Result<String> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SiteProfilerError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SiteProfilerError::Network(format!("{url}: HTTP {status}")));
        }

        if let Some(len) = response.content_length() {
            if len > self.max_response_bytes {
                return Err(SiteProfilerError::Network(format!(
                    "{url}: response too large ({len} bytes, max {})",
                    self.max_response_bytes
                )));
            }
        }

        // Content-Length may be absent or wrong; stop reading at the cap.
        let mut buf: Vec<u8> = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| SiteProfilerError::Network(format!("{url}: failed to read body: {e}")))?
        {
            if (buf.len() + chunk.len()) as u64 > self.max_response_bytes {
                return Err(SiteProfilerError::Network(format!(
                    "{url}: response too large (over {} bytes)",
                    self.max_response_bytes
                )));
            }
            buf.extend_from_slice(&chunk);
        }
        let body = String::from_utf8_lossy(&buf).into_owned();

        // Relays answer errors with short placeholder pages.
        let chars = body.chars().count();
        if chars < self.min_body_chars {
            return Err(SiteProfilerError::Network(format!(
                "{url}: body too short ({chars} chars, min {})",
                self.min_body_chars
            )));
        }

        Ok(body)
    }
}

#[async_trait]
impl TextSource for ResilientFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        self.fetch(url).await
    }
}

/// Expand a relay template for one target.
pub fn relay_url(template: &str, target: &str, ts: i64) -> String {
    template
        .replace("{url}", &urlencoding::encode(target))
        .replace("{ts}", &ts.to_string())
}
