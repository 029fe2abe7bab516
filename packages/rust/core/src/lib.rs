//! Site analysis orchestration for siteprofiler.
//!
//! This crate ties together fetching, sitemap crawling, link extraction and
//! structured model extraction into the end-to-end [`Analyzer::analyze`]
//! workflow, plus the follow-up regeneration requests.

pub mod extraction;
pub mod input;
pub mod normalize;
pub mod pipeline;
pub mod prompts;
pub mod regenerate;

pub use extraction::{GeminiExtractor, ModelRequest, ResponseFormat, StructuredExtractor};
pub use input::validate_site_input;
pub use normalize::{
    ExtractionResponse, add_site_map_assets, assets_from_site_links, build_result,
};
pub use pipeline::{Analyzer, BranchOutcome, ProgressReporter, SilentProgress};
pub use regenerate::{AudienceContext, UspContext, regenerate_audiences, regenerate_usp};
