//! Shared types, error model, and configuration for siteprofiler.
//!
//! This crate is the foundation depended on by all other siteprofiler crates.
//! It provides:
//! - [`SiteProfilerError`]: the unified error type
//! - Domain types ([`SiteLink`], [`AssetItem`], [`AudiencePersona`], [`AnalysisResult`])
//! - Configuration ([`AppConfig`], [`FetchConfig`], [`CrawlConfig`], config loading)
//! - URL helpers ([`resolve_url`], [`has_scheme`])

pub mod config;
pub mod error;
pub mod types;
pub mod urls;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CrawlConfig, CrawlSection, ExtractionConfig, FetchConfig, FetchSection, ModelConfig,
    ModelSection, RelayConfig, config_dir, config_file_path, init_config, load_config,
    load_config_from, resolve_api_key,
};
pub use error::{InputRejection, Result, SiteProfilerError};
pub use types::{
    AnalysisResult, AssetItem, AssetType, AudiencePersona, BusinessModel, DEFAULT_PRIMARY_COLOR,
    DEFAULT_SECONDARY_COLOR, PageType, SiteLink,
};
pub use urls::{has_scheme, is_http_url, resolve_url, truncate_chars};
