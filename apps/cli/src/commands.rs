//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use siteprofiler_core::{
    Analyzer, AudienceContext, GeminiExtractor, ProgressReporter, UspContext, add_site_map_assets,
    regenerate_audiences, regenerate_usp, validate_site_input,
};
use siteprofiler_crawler::SitemapCrawler;
use siteprofiler_fetch::ResilientFetcher;
use siteprofiler_shared::{
    AnalysisResult, AppConfig, CrawlConfig, FetchConfig, ModelConfig, init_config, load_config,
    load_config_from,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// siteprofiler: turn a website into a structured business profile.
#[derive(Parser)]
#[command(
    name = "siteprofiler",
    version,
    about = "Turn a website address into a structured business profile.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.siteprofiler/siteprofiler.toml.
    #[arg(long, global = true, env = "SITEPROFILER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Model ID overriding the configured one.
    #[arg(long, global = true)]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Analyze a website and print its profile as JSON.
    Analyze {
        /// Website address (e.g. example.co.il).
        url: String,

        /// Write the profile to this file instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Single-line JSON output.
        #[arg(long)]
        compact: bool,
    },

    /// Crawl only the sitemaps of a website and print the pages found.
    Sitemap {
        /// Website address.
        url: String,
    },

    /// Regenerate part of a saved profile.
    Regenerate {
        /// What to regenerate.
        #[command(subcommand)]
        target: RegenerateTarget,
    },

    /// Add site-map pages to the catalog of a saved profile.
    AddAssets {
        /// Saved profile (JSON produced by `analyze`).
        #[arg(long)]
        profile: PathBuf,

        /// Page URLs from the profile's site map.
        #[arg(required = true)]
        urls: Vec<String>,

        /// Rewrite the profile file instead of printing the result.
        #[arg(long)]
        in_place: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Regeneration targets.
#[derive(Subcommand)]
pub(crate) enum RegenerateTarget {
    /// A new factual business description.
    Usp(ProfileArgs),
    /// Three new audience personas.
    Audience(ProfileArgs),
}

#[derive(clap::Args)]
pub(crate) struct ProfileArgs {
    /// Saved profile (JSON produced by `analyze`).
    #[arg(long)]
    profile: PathBuf,

    /// Rewrite the profile file instead of printing the result.
    #[arg(long)]
    in_place: bool,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
///
/// Logs go to stderr so stdout carries only JSON output.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "siteprofiler=info",
        1 => "siteprofiler=debug",
        _ => "siteprofiler=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    if let Command::Config {
        action: ConfigAction::Init,
    } = cli.command
    {
        return cmd_config_init();
    }

    let config = resolve_config(cli.config.as_deref(), cli.model)?;

    match cli.command {
        Command::Analyze { url, out, compact } => {
            cmd_analyze(&config, &url, out.as_deref(), compact).await
        }
        Command::Sitemap { url } => cmd_sitemap(&config, &url).await,
        Command::Regenerate { target } => match target {
            RegenerateTarget::Usp(args) => cmd_regenerate_usp(&config, &args).await,
            RegenerateTarget::Audience(args) => cmd_regenerate_audience(&config, &args).await,
        },
        Command::AddAssets {
            profile,
            urls,
            in_place,
        } => cmd_add_assets(&profile, &urls, in_place),
        Command::Config { .. } => cmd_config_show(&config),
    }
}

/// Load the config file and apply command-line overrides.
fn resolve_config(path: Option<&Path>, model: Option<String>) -> Result<AppConfig> {
    let mut config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    if let Some(model) = model {
        config.model.model = model;
    }
    Ok(config)
}

async fn cmd_analyze(
    config: &AppConfig,
    url: &str,
    out: Option<&Path>,
    compact: bool,
) -> Result<()> {
    let analyzer = Analyzer::from_config(config)?;

    info!(url, "analyzing website");

    let reporter = CliProgress::new();
    let outcome = analyzer.analyze(url, &reporter).await;
    if !reporter.spinner.is_finished() {
        reporter.spinner.finish_and_clear();
    }
    let result = outcome?;

    let json = if compact {
        serde_json::to_string(&result)?
    } else {
        serde_json::to_string_pretty(&result)?
    };

    match out {
        Some(path) => {
            std::fs::write(path, json)
                .wrap_err_with(|| format!("failed to write profile to {}", path.display()))?;
            eprintln!(
                "Profile for {} saved to {} ({} assets, {} pages)",
                result.business_name,
                path.display(),
                result.assets.len(),
                result.site_map.len()
            );
        }
        None => println!("{json}"),
    }

    Ok(())
}

async fn cmd_sitemap(config: &AppConfig, url: &str) -> Result<()> {
    let site_url = validate_site_input(url)?;
    let fetcher = ResilientFetcher::new(&FetchConfig::from(config))?;

    info!(%site_url, "crawling sitemaps");
    let crawler = SitemapCrawler::new(&fetcher, CrawlConfig::from(config));
    let links = crawler.crawl(&site_url).await;

    println!("{}", serde_json::to_string_pretty(&links)?);
    Ok(())
}

async fn cmd_regenerate_usp(config: &AppConfig, args: &ProfileArgs) -> Result<()> {
    let mut profile = read_profile(&args.profile)?;
    let extractor = GeminiExtractor::new(ModelConfig::from_app(config)?)?;

    let usp = regenerate_usp(&extractor, &UspContext::from(&profile)).await?;
    if args.in_place {
        profile.apply_usp(usp);
        write_profile(&args.profile, &profile)?;
        eprintln!("Description updated in {}", args.profile.display());
    } else {
        println!("{usp}");
    }
    Ok(())
}

async fn cmd_regenerate_audience(config: &AppConfig, args: &ProfileArgs) -> Result<()> {
    let mut profile = read_profile(&args.profile)?;
    let extractor = GeminiExtractor::new(ModelConfig::from_app(config)?)?;

    let audiences = regenerate_audiences(&extractor, &AudienceContext::from(&profile)).await?;
    if args.in_place {
        profile.apply_audiences(audiences);
        write_profile(&args.profile, &profile)?;
        eprintln!("Audiences updated in {}", args.profile.display());
    } else {
        println!("{}", serde_json::to_string_pretty(&audiences)?);
    }
    Ok(())
}

fn cmd_add_assets(path: &Path, urls: &[String], in_place: bool) -> Result<()> {
    let mut profile = read_profile(path)?;

    let added = add_site_map_assets(&mut profile, urls)?;
    info!(added, "added site-map pages to catalog");

    if in_place {
        write_profile(path, &profile)?;
        eprintln!("Catalog updated in {}", path.display());
    } else {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_profile(path: &Path) -> Result<AnalysisResult> {
    let raw = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read profile {}", path.display()))?;
    serde_json::from_str(&raw)
        .wrap_err_with(|| format!("{} is not a saved profile", path.display()))
}

fn write_profile(path: &Path, profile: &AnalysisResult) -> Result<()> {
    let json = serde_json::to_string_pretty(profile)?;
    std::fs::write(path, json)
        .wrap_err_with(|| format!("failed to write profile {}", path.display()))
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner on stderr.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _result: &AnalysisResult) {
        self.spinner.finish_and_clear();
    }
}
