//! Application configuration for siteprofiler.
//!
//! User config lives at `~/.siteprofiler/siteprofiler.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SiteProfilerError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "siteprofiler.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".siteprofiler";

// ---------------------------------------------------------------------------
// Config structs (matching siteprofiler.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Relay and reader-mode fetching.
    #[serde(default)]
    pub fetch: FetchSection,

    /// Sitemap crawling limits.
    #[serde(default)]
    pub crawl: CrawlSection,

    /// Content selection and truncation budgets.
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Structured-extraction model settings.
    #[serde(default)]
    pub model: ModelSection,
}

/// One relay in the ordered fallback chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Name used in logs.
    pub name: String,
    /// URL template. `{url}` is replaced by the URL-encoded target and
    /// `{ts}` by the current Unix time in milliseconds.
    pub template: String,
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchSection {
    /// Relays tried in order.
    #[serde(default = "default_relays")]
    pub relays: Vec<RelayConfig>,

    /// Reader-mode endpoint; the raw target URL is appended to it.
    #[serde(default = "default_reader_endpoint")]
    pub reader_endpoint: String,

    /// Bodies with fewer characters than this count as a failed attempt.
    #[serde(default = "default_min_body_chars")]
    pub min_body_chars: usize,

    /// Timeout for a single relay attempt, in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    /// Larger bodies count as a failed attempt.
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: u64,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            relays: default_relays(),
            reader_endpoint: default_reader_endpoint(),
            min_body_chars: default_min_body_chars(),
            timeout_secs: default_fetch_timeout(),
            max_response_bytes: default_max_response_bytes(),
        }
    }
}

fn default_relays() -> Vec<RelayConfig> {
    vec![
        RelayConfig {
            name: "corsproxy".into(),
            template: "https://corsproxy.io/?{url}".into(),
        },
        RelayConfig {
            name: "allorigins".into(),
            template: "https://api.allorigins.win/raw?url={url}&t={ts}".into(),
        },
    ]
}
fn default_reader_endpoint() -> String {
    "https://r.jina.ai/".into()
}
fn default_min_body_chars() -> usize {
    50
}
fn default_fetch_timeout() -> u64 {
    8
}
fn default_max_response_bytes() -> u64 {
    10 * 1024 * 1024
}

/// `[crawl]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSection {
    /// Conventional sitemap locations, tried in order.
    #[serde(default = "default_sitemap_paths")]
    pub sitemap_paths: Vec<String>,

    /// Deepest sitemap level that is still fetched (the entry file is level 1).
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Stop collecting leaves after this many.
    #[serde(default = "default_max_leaves")]
    pub max_leaves: usize,

    /// Maximum sitemap fetches in flight at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for CrawlSection {
    fn default() -> Self {
        Self {
            sitemap_paths: default_sitemap_paths(),
            max_depth: default_max_depth(),
            max_leaves: default_max_leaves(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_sitemap_paths() -> Vec<String> {
    ["/sitemap.xml", "/sitemap_index.xml", "/wp-sitemap.xml", "/sitemap.txt"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_max_depth() -> u32 {
    2
}
fn default_max_leaves() -> usize {
    1000
}
fn default_concurrency() -> usize {
    4
}

/// `[extraction]` section. Used directly at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Reader-mode text must be longer than this to become the primary content.
    #[serde(default = "default_reader_min_chars")]
    pub reader_min_chars: usize,

    /// Primary content sent to the model is cut to this many characters.
    #[serde(default = "default_primary_content_chars")]
    pub primary_content_chars: usize,

    /// Raw HTML kept as visual context is cut to this many characters.
    #[serde(default = "default_visual_context_chars")]
    pub visual_context_chars: usize,

    /// Maximum link pattern matches scanned per page.
    #[serde(default = "default_max_link_matches")]
    pub max_link_matches: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            reader_min_chars: default_reader_min_chars(),
            primary_content_chars: default_primary_content_chars(),
            visual_context_chars: default_visual_context_chars(),
            max_link_matches: default_max_link_matches(),
        }
    }
}

fn default_reader_min_chars() -> usize {
    100
}
fn default_primary_content_chars() -> usize {
    40_000
}
fn default_visual_context_chars() -> usize {
    20_000
}
fn default_max_link_matches() -> usize {
    500
}

/// `[model]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSection {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// API base URL.
    #[serde(default = "default_model_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds.
    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            model: default_model(),
            endpoint: default_model_endpoint(),
            timeout_secs: default_model_timeout(),
        }
    }
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".into()
}
fn default_model() -> String {
    "gemini-3-flash-preview".into()
}
fn default_model_endpoint() -> String {
    "https://generativelanguage.googleapis.com".into()
}
fn default_model_timeout() -> u64 {
    120
}

// ---------------------------------------------------------------------------
// Runtime configs (merged from config file + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime fetch configuration.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub relays: Vec<RelayConfig>,
    pub reader_endpoint: String,
    pub min_body_chars: usize,
    pub timeout: Duration,
    pub max_response_bytes: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            relays: config.fetch.relays.clone(),
            reader_endpoint: config.fetch.reader_endpoint.clone(),
            min_body_chars: config.fetch.min_body_chars,
            timeout: Duration::from_secs(config.fetch.timeout_secs),
            max_response_bytes: config.fetch.max_response_bytes,
        }
    }
}

/// Runtime sitemap crawl configuration.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub sitemap_paths: Vec<String>,
    pub max_depth: u32,
    pub max_leaves: usize,
    pub concurrency: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for CrawlConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            sitemap_paths: config.crawl.sitemap_paths.clone(),
            max_depth: config.crawl.max_depth,
            max_leaves: config.crawl.max_leaves,
            concurrency: config.crawl.concurrency.max(1),
        }
    }
}

/// Runtime model configuration, with the API key already resolved.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl ModelConfig {
    /// Build from the config file, reading the API key from the environment.
    pub fn from_app(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            api_key: resolve_api_key(config)?,
            model: config.model.model.clone(),
            endpoint: config.model.endpoint.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.model.timeout_secs),
        })
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.siteprofiler/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| SiteProfilerError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.siteprofiler/siteprofiler.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SiteProfilerError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        SiteProfilerError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    if config.fetch.relays.is_empty() {
        return Err(SiteProfilerError::config(
            "[fetch] relays must list at least one relay",
        ));
    }

    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| SiteProfilerError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| SiteProfilerError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SiteProfilerError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the model API key from the env var named in the config.
pub fn resolve_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.model.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(SiteProfilerError::config(format!(
            "model API key not found. Set the {var_name} environment variable."
        ))),
    }
}
