//! End-to-end `analyze` pipeline: input → gather → select → map links → extract → normalize.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use siteprofiler_crawler::{SitemapCrawler, extract_links};
use siteprofiler_fetch::{ReaderFetcher, ResilientFetcher, TextSource};
use siteprofiler_shared::{
    AnalysisResult, AppConfig, CrawlConfig, ExtractionConfig, FetchConfig, ModelConfig, Result,
    SiteLink, SiteProfilerError, truncate_chars,
};

use crate::extraction::{GeminiExtractor, ModelRequest, StructuredExtractor, parse_json_response};
use crate::input::validate_site_input;
use crate::normalize::{ExtractionResponse, build_result};
use crate::prompts;

/// Settled state of one concurrently gathered input.
#[derive(Debug)]
pub enum BranchOutcome<T> {
    /// The branch produced a usable value.
    Ready(T),
    /// The branch succeeded but had nothing to offer.
    Empty,
    /// The branch failed.
    Failed(SiteProfilerError),
}

impl BranchOutcome<String> {
    fn from_fetch(result: Result<String>) -> Self {
        match result {
            Ok(body) if body.trim().is_empty() => Self::Empty,
            Ok(body) => Self::Ready(body),
            Err(e) => Self::Failed(e),
        }
    }
}

impl BranchOutcome<Vec<SiteLink>> {
    fn from_links(links: Vec<SiteLink>) -> Self {
        if links.is_empty() {
            Self::Empty
        } else {
            Self::Ready(links)
        }
    }
}

impl<T> BranchOutcome<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Ready(_) => "ready".to_string(),
            Self::Empty => "empty".to_string(),
            Self::Failed(e) => format!("failed: {e}"),
        }
    }
}

/// Text handed to the extraction model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSources {
    /// Reader-mode text when long enough, otherwise raw HTML.
    pub primary: String,
    /// Leading slice of the raw HTML, empty when it could not be fetched.
    pub visual_context: String,
}

/// Pick the primary content and visual context from the gathered bodies.
///
/// Fails with [`SiteProfilerError::SiteUnreadable`] when neither body is usable.
pub fn select_sources(
    reader: BranchOutcome<String>,
    html: BranchOutcome<String>,
    config: &ExtractionConfig,
) -> Result<PageSources> {
    let visual_context = match &html {
        BranchOutcome::Ready(body) => truncate_chars(body, config.visual_context_chars).to_string(),
        _ => String::new(),
    };

    let primary = match (reader, html) {
        (BranchOutcome::Ready(text), _) if text.chars().count() > config.reader_min_chars => text,
        (_, BranchOutcome::Ready(body)) => body,
        (reader, html) => {
            return Err(SiteProfilerError::unreadable(format!(
                "no page content (reader {}; html {})",
                reader.describe(),
                html.describe()
            )));
        }
    };

    Ok(PageSources {
        primary,
        visual_context,
    })
}

/// Sitemap links first, then content links not already present.
pub fn merge_site_map(
    mut sitemap: Vec<SiteLink>,
    content: &str,
    site_url: &str,
    max_matches: usize,
) -> Vec<SiteLink> {
    let known: HashSet<String> = sitemap.iter().map(|l| l.url.clone()).collect();
    let extracted = extract_links(content, site_url, &known, max_matches);
    debug!(
        from_sitemap = sitemap.len(),
        from_content = extracted.len(),
        "merged site map"
    );
    sitemap.extend(extracted);
    sitemap
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the analysis completes.
    fn done(&self, result: &AnalysisResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _result: &AnalysisResult) {}
}

/// Runs one site analysis from raw user input to [`AnalysisResult`].
pub struct Analyzer {
    raw: Arc<dyn TextSource>,
    reader: Arc<dyn TextSource>,
    extractor: Arc<dyn StructuredExtractor>,
    crawl: CrawlConfig,
    extraction: ExtractionConfig,
}

impl Analyzer {
    pub fn new(
        raw: Arc<dyn TextSource>,
        reader: Arc<dyn TextSource>,
        extractor: Arc<dyn StructuredExtractor>,
        crawl: CrawlConfig,
        extraction: ExtractionConfig,
    ) -> Self {
        Self {
            raw,
            reader,
            extractor,
            crawl,
            extraction,
        }
    }

    /// Wire the production relay chain, reader service and Gemini model.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let fetch = FetchConfig::from(config);
        let relays = ResilientFetcher::new(&fetch)?;
        let reader = ReaderFetcher::new(&fetch, relays.clone());
        let extractor = GeminiExtractor::new(ModelConfig::from_app(config)?)?;

        Ok(Self::new(
            Arc::new(relays),
            Arc::new(reader),
            Arc::new(extractor),
            CrawlConfig::from(config),
            config.extraction.clone(),
        ))
    }

    /// Analyze the site the user typed in.
    ///
    /// Input problems come back as [`SiteProfilerError::InvalidInput`]; any
    /// failure after validation is reported as
    /// [`SiteProfilerError::SiteUnreadable`].
    #[instrument(skip_all, fields(input = %input))]
    pub async fn analyze(
        &self,
        input: &str,
        progress: &dyn ProgressReporter,
    ) -> Result<AnalysisResult> {
        let start = Instant::now();
        let site_url = validate_site_input(input)?;
        info!(%site_url, "starting analysis");

        let result = match self.run(&site_url, progress).await {
            Ok(result) => result,
            Err(SiteProfilerError::SiteUnreadable { reason }) => {
                warn!(%reason, "site unreadable");
                return Err(SiteProfilerError::SiteUnreadable { reason });
            }
            Err(e) => {
                warn!(error = %e, "analysis failed");
                return Err(SiteProfilerError::unreadable(e.to_string()));
            }
        };

        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            assets = result.assets.len(),
            links = result.site_map.len(),
            "analysis complete"
        );
        progress.done(&result);
        Ok(result)
    }

    async fn run(&self, site_url: &str, progress: &dyn ProgressReporter) -> Result<AnalysisResult> {
        // --- Phase 1: Gather ---
        progress.phase("Reading site");
        let crawler = SitemapCrawler::new(self.raw.as_ref(), self.crawl.clone());
        let (links, reader, html) = tokio::join!(
            crawler.crawl(site_url),
            self.reader.fetch_text(site_url),
            self.raw.fetch_text(site_url),
        );

        let sitemap = BranchOutcome::from_links(links);
        let reader = BranchOutcome::from_fetch(reader);
        let html = BranchOutcome::from_fetch(html);
        info!(
            sitemap = %sitemap.describe(),
            reader = %reader.describe(),
            html = %html.describe(),
            "content gathered"
        );

        // --- Phase 2: Select ---
        let sources = select_sources(reader, html, &self.extraction)?;

        // --- Phase 3: Site map ---
        progress.phase("Mapping pages");
        let site_map = merge_site_map(
            sitemap.ready().unwrap_or_default(),
            &sources.primary,
            site_url,
            self.extraction.max_link_matches,
        );

        // --- Phase 4: Extract ---
        progress.phase("Extracting business profile");
        let content = truncate_chars(&sources.primary, self.extraction.primary_content_chars);
        let prompt = prompts::extraction_prompt(site_url, content, &sources.visual_context);
        let answer = self.extractor.generate(&ModelRequest::json(prompt)).await?;
        let response: ExtractionResponse = parse_json_response(&answer)?;

        // --- Phase 5: Normalize ---
        Ok(build_result(response, site_url, site_map))
    }
}
