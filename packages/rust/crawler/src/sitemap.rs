//! Recursive sitemap crawler.
//!
//! Tries the conventional sitemap locations of a site one after another and
//! follows nested sitemaps (index files) down to a fixed depth, collecting
//! every non-sitemap URL as a classified [`SiteLink`] leaf.

use std::collections::HashSet;
use std::sync::LazyLock;

use futures::future::{BoxFuture, join_all};
use regex::Regex;
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, info, instrument, warn};
use url::Url;

use siteprofiler_fetch::TextSource;
use siteprofiler_shared::{CrawlConfig, SiteLink, is_http_url, resolve_url};

use crate::title::title_from_url;

/// Matches `<loc>…</loc>` on a single line.
static LOC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<loc>(.*?)</loc>").expect("loc regex"));

// ---------------------------------------------------------------------------
// CrawlState
// ---------------------------------------------------------------------------

/// Per-run state. `visited` only grows.
#[derive(Debug, Default)]
struct CrawlState {
    visited: HashSet<String>,
    leaves: Vec<SiteLink>,
    leaf_cap_hit: bool,
}

/// Everything one `crawl` call shares between its branches.
struct CrawlRun<'a> {
    base_url: &'a str,
    state: Mutex<CrawlState>,
    permits: Semaphore,
}

// ---------------------------------------------------------------------------
// SitemapCrawler
// ---------------------------------------------------------------------------

/// Discovers a site's pages from its sitemap files.
pub struct SitemapCrawler<'a> {
    source: &'a dyn TextSource,
    config: CrawlConfig,
}

impl<'a> SitemapCrawler<'a> {
    /// Create a crawler that fetches sitemap files through `source`.
    pub fn new(source: &'a dyn TextSource, config: CrawlConfig) -> Self {
        Self { source, config }
    }

    /// Crawl the sitemaps of `base_url` and return the discovered leaf pages.
    ///
    /// Candidate locations are tried in order and the first one that yields
    /// at least one leaf wins. Fetch failures only shrink the result; a site
    /// without sitemaps yields an empty list.
    #[instrument(skip(self))]
    pub async fn crawl(&self, base_url: &str) -> Vec<SiteLink> {
        let base = match Url::parse(base_url) {
            Ok(base) => base,
            Err(e) => {
                warn!(error = %e, "unparseable base URL, skipping sitemap crawl");
                return Vec::new();
            }
        };

        let run = CrawlRun {
            base_url,
            state: Mutex::new(CrawlState::default()),
            permits: Semaphore::new(self.config.concurrency.max(1)),
        };

        for candidate in &self.config.sitemap_paths {
            let entry = match base.join(candidate) {
                Ok(entry) => entry.to_string(),
                Err(e) => {
                    warn!(%candidate, error = %e, "bad sitemap candidate path");
                    continue;
                }
            };

            self.crawl_resource(&run, entry, 1).await;

            if !run.state.lock().await.leaves.is_empty() {
                debug!(%candidate, "sitemap candidate produced leaves");
                break;
            }
        }

        let state = run.state.into_inner();
        info!(
            leaves = state.leaves.len(),
            visited = state.visited.len(),
            "sitemap crawl finished"
        );
        state.leaves
    }

    /// Fetch one sitemap resource and process its entries.
    ///
    /// Leaf entries are recorded before nested sitemaps are followed; all
    /// nested sitemaps of one file are crawled concurrently and awaited
    /// before this call completes.
    fn crawl_resource<'s>(
        &'s self,
        run: &'s CrawlRun<'s>,
        url: String,
        depth: u32,
    ) -> BoxFuture<'s, ()> {
        Box::pin(async move {
            if depth > self.config.max_depth {
                debug!(%url, depth, "max sitemap depth exceeded");
                return;
            }
            if !run.state.lock().await.visited.insert(url.clone()) {
                return;
            }

            let body = {
                let _permit = match run.permits.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => return,
                };
                self.source.fetch_text(&url).await
            };

            let body = match body {
                Ok(body) => body,
                Err(e) => {
                    warn!(%url, error = %e, "failed to fetch sitemap");
                    return;
                }
            };

            if !body.contains("<loc>") && !body.contains("http") {
                debug!(%url, "not a sitemap, stopping branch");
                return;
            }

            let mut nested = Vec::new();
            {
                let mut state = run.state.lock().await;
                for child in extract_locs(&body) {
                    let Some(child) = absolutize(&child, run.base_url) else {
                        debug!(%child, "dropping non-http sitemap entry");
                        continue;
                    };

                    if looks_like_sitemap(&child) {
                        nested.push(child);
                    } else {
                        self.record_leaf(&mut state, child);
                    }
                }
            }

            join_all(
                nested
                    .into_iter()
                    .map(|child| self.crawl_resource(run, child, depth + 1)),
            )
            .await;
        })
    }

    /// Mark `url` visited and keep it as a leaf unless it is an XML resource.
    fn record_leaf(&self, state: &mut CrawlState, url: String) {
        if !state.visited.insert(url.clone()) {
            return;
        }
        if url.to_lowercase().contains(".xml") {
            return;
        }
        if state.leaves.len() >= self.config.max_leaves {
            if !state.leaf_cap_hit {
                warn!(max_leaves = self.config.max_leaves, "leaf cap reached, ignoring the rest");
                state.leaf_cap_hit = true;
            }
            return;
        }

        let title = title_from_url(&url);
        state.leaves.push(SiteLink::new(title, url));
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Every `<loc>` value in `xml`, trimmed and entity-decoded.
pub fn extract_locs(xml: &str) -> Vec<String> {
    LOC_RE
        .captures_iter(xml)
        .map(|caps| decode_xml_entities(caps[1].trim()))
        .filter(|loc| !loc.is_empty())
        .collect()
}

/// Decode the five predefined XML entities.
fn decode_xml_entities(raw: &str) -> String {
    raw.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
}

/// True for URLs that point at another sitemap file.
pub fn looks_like_sitemap(url: &str) -> bool {
    let lower = url.to_lowercase();
    let path = lower.split(['?', '#']).next().unwrap_or(&lower);
    path.ends_with(".xml") || (lower.contains("sitemap") && path.ends_with(".txt"))
}

/// Make a sitemap entry absolute; entries that still are not http(s) are dropped.
fn absolutize(loc: &str, base_url: &str) -> Option<String> {
    if is_http_url(loc) {
        return Some(loc.to_string());
    }
    resolve_url(Some(loc), base_url).filter(|u| is_http_url(u))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use siteprofiler_shared::{PageType, Result, SiteProfilerError};

    use super::*;

    /// In-memory `TextSource` that counts how often each URL is fetched.
    #[derive(Default)]
    struct FixtureSource {
        pages: HashMap<String, String>,
        hits: StdMutex<HashMap<String, usize>>,
    }

    impl FixtureSource {
        fn with(mut self, url: &str, body: impl Into<String>) -> Self {
            self.pages.insert(url.to_string(), body.into());
            self
        }

        fn hits(&self, url: &str) -> usize {
            self.hits.lock().unwrap().get(url).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl TextSource for FixtureSource {
        async fn fetch_text(&self, url: &str) -> Result<String> {
            *self.hits.lock().unwrap().entry(url.to_string()).or_default() += 1;
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| SiteProfilerError::FetchExhausted {
                    target: url.to_string(),
                    attempts: 2,
                })
        }
    }

    fn fixture(name: &str) -> String {
        let path = format!("../../../fixtures/sitemaps/{name}");
        std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing fixture: {path}"))
    }

    fn urlset(urls: &[&str]) -> String {
        let entries: String = urls
            .iter()
            .map(|u| format!("  <url><loc>{u}</loc></url>\n"))
            .collect();
        format!("<?xml version=\"1.0\"?>\n<urlset>\n{entries}</urlset>\n")
    }

    fn shop_source() -> FixtureSource {
        FixtureSource::default()
            .with("https://shop.example/sitemap.xml", fixture("index.xml"))
            .with("https://shop.example/sitemap-products.xml", fixture("products.xml"))
            .with("https://shop.example/sitemap-pages.xml", fixture("pages.xml"))
    }

    #[tokio::test]
    async fn crawls_index_and_dedupes_shared_leaf() {
        let source = shop_source();
        let crawler = SitemapCrawler::new(&source, CrawlConfig::default());
        let leaves = crawler.crawl("https://shop.example").await;

        let about: Vec<_> = leaves
            .iter()
            .filter(|l| l.url == "https://shop.example/about-us")
            .collect();
        assert_eq!(about.len(), 1);
        assert_eq!(leaves.len(), 7);

        // Each sitemap file is fetched exactly once.
        assert_eq!(source.hits("https://shop.example/sitemap.xml"), 1);
        assert_eq!(source.hits("https://shop.example/sitemap-products.xml"), 1);
        assert_eq!(source.hits("https://shop.example/sitemap-pages.xml"), 1);

        // First candidate produced leaves, so the rest are never tried.
        assert_eq!(source.hits("https://shop.example/sitemap_index.xml"), 0);
    }

    #[tokio::test]
    async fn leaves_are_titled_and_classified() {
        let source = shop_source();
        let crawler = SitemapCrawler::new(&source, CrawlConfig::default());
        let leaves = crawler.crawl("https://shop.example").await;
        let by_url: HashMap<_, _> = leaves.iter().map(|l| (l.url.as_str(), l)).collect();

        let shoes = by_url["https://shop.example/products/red-running-shoes"];
        assert_eq!(shoes.title, "Red Running Shoes");
        assert_eq!(shoes.page_type, PageType::Product);

        let hat = by_url["https://shop.example/products/blue_wool_hat.html"];
        assert_eq!(hat.title, "Blue Wool Hat");

        let contact = by_url["https://shop.example/%D7%A6%D7%95%D7%A8-%D7%A7%D7%A9%D7%A8"];
        assert_eq!(contact.title, "צור קשר");
        assert_eq!(contact.page_type, PageType::General);

        assert_eq!(
            by_url["https://shop.example/collections/hats"].page_type,
            PageType::Category
        );
        assert_eq!(
            by_url["https://shop.example/blog/summer-sale"].page_type,
            PageType::Blog
        );

        // Entity-decoded.
        assert!(by_url.contains_key("https://shop.example/search?q=hats&sort=new"));
        // XML resources never become leaves.
        assert!(!leaves.iter().any(|l| l.url.contains(".xml")));
    }

    #[tokio::test]
    async fn depth_two_leaf_is_included() {
        let source = FixtureSource::default()
            .with(
                "https://site.test/sitemap.xml",
                urlset(&["https://site.test/sub-sitemap.xml"]),
            )
            .with(
                "https://site.test/sub-sitemap.xml",
                urlset(&["https://site.test/deep-page"]),
            );

        let crawler = SitemapCrawler::new(&source, CrawlConfig::default());
        let leaves = crawler.crawl("https://site.test").await;
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].url, "https://site.test/deep-page");
    }

    #[tokio::test]
    async fn recursion_halts_past_max_depth() {
        let source = FixtureSource::default()
            .with(
                "https://site.test/sitemap.xml",
                urlset(&["https://site.test/sub-sitemap.xml"]),
            )
            .with(
                "https://site.test/sub-sitemap.xml",
                urlset(&["https://site.test/sub-sub-sitemap.xml"]),
            )
            .with(
                "https://site.test/sub-sub-sitemap.xml",
                urlset(&["https://site.test/deepest-page"]),
            );

        let crawler = SitemapCrawler::new(&source, CrawlConfig::default());
        let leaves = crawler.crawl("https://site.test").await;
        assert!(leaves.iter().all(|l| l.url != "https://site.test/deepest-page"));
        assert_eq!(source.hits("https://site.test/sub-sub-sitemap.xml"), 0);
    }

    #[tokio::test]
    async fn cyclic_sitemaps_are_fetched_once() {
        let source = FixtureSource::default()
            .with(
                "https://site.test/sitemap.xml",
                urlset(&["https://site.test/a.xml", "https://site.test/page-one"]),
            )
            .with(
                "https://site.test/a.xml",
                urlset(&["https://site.test/sitemap.xml", "https://site.test/page-one"]),
            );

        let crawler = SitemapCrawler::new(&source, CrawlConfig::default());
        let leaves = crawler.crawl("https://site.test").await;
        assert_eq!(leaves.len(), 1);
        assert_eq!(source.hits("https://site.test/sitemap.xml"), 1);
        assert_eq!(source.hits("https://site.test/a.xml"), 1);
    }

    #[tokio::test]
    async fn falls_through_to_next_candidate() {
        let source = FixtureSource::default()
            .with("https://site.test/sitemap.xml", "<html><body>Not found</body></html>")
            .with(
                "https://site.test/wp-sitemap.xml",
                urlset(&["https://site.test/services/cleaning"]),
            );

        let crawler = SitemapCrawler::new(&source, CrawlConfig::default());
        let leaves = crawler.crawl("https://site.test").await;
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].title, "Cleaning");
        assert_eq!(source.hits("https://site.test/sitemap_index.xml"), 1);
        assert_eq!(source.hits("https://site.test/sitemap.txt"), 0);
    }

    #[tokio::test]
    async fn no_sitemaps_yields_empty() {
        let source = FixtureSource::default();
        let crawler = SitemapCrawler::new(&source, CrawlConfig::default());
        assert!(crawler.crawl("https://site.test").await.is_empty());
        assert_eq!(source.hits("https://site.test/sitemap.txt"), 1);
    }

    #[tokio::test]
    async fn relative_locs_are_made_absolute() {
        let source = FixtureSource::default().with(
            "https://site.test/sitemap.xml",
            urlset(&["/about", "ftp://site.test/file"]),
        );
        let crawler = SitemapCrawler::new(&source, CrawlConfig::default());
        let leaves = crawler.crawl("https://site.test").await;
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].url, "https://site.test/about");
    }

    #[tokio::test]
    async fn leaf_cap_is_enforced() {
        let urls: Vec<String> = (0..20).map(|i| format!("https://site.test/p{i}")).collect();
        let refs: Vec<&str> = urls.iter().map(String::as_str).collect();
        let source =
            FixtureSource::default().with("https://site.test/sitemap.xml", urlset(&refs));

        let config = CrawlConfig {
            max_leaves: 5,
            ..CrawlConfig::default()
        };
        let crawler = SitemapCrawler::new(&source, config);
        assert_eq!(crawler.crawl("https://site.test").await.len(), 5);
    }

    #[test]
    fn sitemap_detection() {
        assert!(looks_like_sitemap("https://a.com/sitemap-1.xml"));
        assert!(looks_like_sitemap("https://a.com/feed.XML"));
        assert!(looks_like_sitemap("https://a.com/sitemap.txt"));
        assert!(looks_like_sitemap("https://a.com/post-sitemap.xml?v=2"));
        assert!(!looks_like_sitemap("https://a.com/robots.txt"));
        assert!(!looks_like_sitemap("https://a.com/products/shoe"));
    }

    #[test]
    fn xml_lookalike_is_visited_but_not_a_leaf() {
        let source = FixtureSource::default();
        let crawler = SitemapCrawler::new(&source, CrawlConfig::default());
        let mut state = CrawlState::default();

        crawler.record_leaf(&mut state, "https://a.com/export.xml.html".into());
        crawler.record_leaf(&mut state, "https://a.com/about".into());
        crawler.record_leaf(&mut state, "https://a.com/about".into());

        assert_eq!(state.leaves.len(), 1);
        assert!(state.visited.contains("https://a.com/export.xml.html"));
    }

    #[test]
    fn loc_extraction_decodes_entities() {
        let xml = "<urlset><url><loc> https://a.com/?x=1&amp;y=&quot;2&quot; </loc></url><url><loc></loc></url></urlset>";
        assert_eq!(extract_locs(xml), vec!["https://a.com/?x=1&y=\"2\"".to_string()]);
    }
}
