//! Remote text retrieval through unreliable relays.
//!
//! The analysed site is never contacted directly. Raw bodies are pulled
//! through an ordered chain of public relays ([`ResilientFetcher`]), and a
//! readable-text rendering comes from a reader-mode service that falls back
//! to the same chain ([`ReaderFetcher`]).
//!
//! Both implement [`TextSource`], the capability the crawler and the
//! orchestrator consume, so they can be swapped for in-memory fakes in tests.

mod reader;
mod relay;

use async_trait::async_trait;
use siteprofiler_shared::Result;

pub use reader::ReaderFetcher;
pub use relay::{ResilientFetcher, relay_url};

/// Anything that can turn an absolute URL into its textual body.
#[async_trait]
pub trait TextSource: Send + Sync {
    /// Fetch the body of `url` as text.
    async fn fetch_text(&self, url: &str) -> Result<String>;
}
