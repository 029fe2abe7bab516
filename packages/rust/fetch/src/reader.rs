//! Reader-mode (readability-cleaned) page text.

use async_trait::async_trait;
use tracing::{debug, instrument};

use siteprofiler_shared::{FetchConfig, Result};

use crate::TextSource;
use crate::relay::ResilientFetcher;

/// Fetches a cleaned, readable rendering of a page from a reader-mode relay.
///
/// The reader endpoint is called directly first; if that fails or returns a
/// too-short body, the reader URL itself is pushed through the
/// [`ResilientFetcher`] relay chain.
#[derive(Clone)]
pub struct ReaderFetcher {
    endpoint: String,
    fetcher: ResilientFetcher,
}

impl ReaderFetcher {
    /// Create a reader fetcher that falls back to `fetcher`.
    pub fn new(config: &FetchConfig, fetcher: ResilientFetcher) -> Self {
        Self {
            endpoint: config.reader_endpoint.clone(),
            fetcher,
        }
    }

    /// The reader-mode URL for a target (`{endpoint}{target}`).
    pub fn reader_url(&self, target: &str) -> String {
        format!("{}{target}", self.endpoint)
    }

    /// Fetch readable text for `target`.
    #[instrument(skip(self))]
    pub async fn fetch(&self, target: &str) -> Result<String> {
        let reader_url = self.reader_url(target);

        match self.fetcher.attempt(&reader_url).await {
            Ok(text) => Ok(text),
            Err(e) => {
                debug!(error = %e, "direct reader fetch failed, trying relays");
                self.fetcher.fetch(&reader_url).await
            }
        }
    }
}

#[async_trait]
impl TextSource for ReaderFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        self.fetch(url).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use siteprofiler_shared::{RelayConfig, SiteProfilerError};
    use wiremock::matchers::{path, path_regex, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const READABLE: &str = "Title: Acme\n\nMarkdown Content:\nAcme builds widgets for every household since 1999.";

    fn setup(server: &MockServer) -> ReaderFetcher {
        let config = FetchConfig {
            relays: vec![RelayConfig {
                name: "relay".into(),
                template: format!("{}/relay?url={{url}}", server.uri()),
            }],
            reader_endpoint: format!("{}/reader/", server.uri()),
            min_body_chars: 50,
            timeout: Duration::from_millis(500),
            max_response_bytes: 1024 * 1024,
        };
        let fetcher = ResilientFetcher::new(&config).unwrap();
        ReaderFetcher::new(&config, fetcher)
    }

    #[tokio::test]
    async fn direct_reader_success() {
        let server = MockServer::start().await;
        Mock::given(path_regex("^/reader/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(READABLE))
            .mount(&server)
            .await;
        Mock::given(path("/relay"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let reader = setup(&server);
        assert_eq!(reader.fetch("https://acme.co.il").await.unwrap(), READABLE);
    }

    #[tokio::test]
    async fn falls_back_to_relay_with_reader_url_as_target() {
        let server = MockServer::start().await;
        Mock::given(path_regex("^/reader/"))
            .respond_with(ResponseTemplate::new(451))
            .mount(&server)
            .await;

        let reader = setup(&server);
        let reader_url = reader.reader_url("https://acme.co.il");
        Mock::given(path("/relay"))
            .and(query_param("url", reader_url.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_string(READABLE))
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(reader.fetch("https://acme.co.il").await.unwrap(), READABLE);
    }

    #[tokio::test]
    async fn short_direct_body_falls_back() {
        let server = MockServer::start().await;
        Mock::given(path_regex("^/reader/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Loading..."))
            .mount(&server)
            .await;
        Mock::given(path("/relay"))
            .respond_with(ResponseTemplate::new(200).set_body_string(READABLE))
            .mount(&server)
            .await;

        let reader = setup(&server);
        assert_eq!(reader.fetch("https://acme.co.il").await.unwrap(), READABLE);
    }

    #[tokio::test]
    async fn fails_when_direct_and_relays_fail() {
        let server = MockServer::start().await;
        Mock::given(path_regex("^/reader/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(path("/relay"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let reader = setup(&server);
        let err = reader.fetch("https://acme.co.il").await.unwrap_err();
        assert!(matches!(err, SiteProfilerError::FetchExhausted { .. }));
    }
}
