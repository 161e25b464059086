//! # gemsync-cli
//!
//! Entry point for `gemsync`. Parses the command line, installs logging, layers the
//! configuration, builds the RubyGems and BestGems clients once and hands them to the
//! pipeline. Exits non-zero only when the run itself fails (a catalog page could not be
//! listed, or the configuration is unusable).

use std::collections::HashMap;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};
use gemsync_config::{ConfigLayering, ConfigLoader, SyncConfig};
use gemsync_pipeline::{PipelineConfig, RetryConfig, SyncDriver, SyncReport};
use gemsync_registry::{BestGemsClient, HttpConfig, RubyGemsClient};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

mod output;

use output::Output;

/// Copy RubyGems package metadata into the BestGems analytics API
#[derive(Parser, Debug)]
#[command(name = "gemsync", version, about)]
pub struct Cli {
    /// Base URL of the BestGems API, e.g. https://bestgems.org
    #[arg(value_name = "SINK_BASE_URL")]
    pub sink_base_url: Option<String>,

    /// Bearer credential for the BestGems API
    #[arg(value_name = "API_KEY")]
    pub api_key: Option<String>,

    /// Configuration file (default: gemsync.toml in this or a parent directory)
    #[arg(long, env = "GEMSYNC_CONFIG", value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// RubyGems base URL
    #[arg(long, value_name = "URL")]
    pub source_url: Option<String>,

    /// Packages synchronized at the same time
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Attempts per remote call before giving up
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Log line format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl Cli {
    /// Command-line values as dotted config keys, the highest-priority layer
    fn overrides(&self) -> HashMap<String, String> {
        let mut overrides = HashMap::new();
        let mut set = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                overrides.insert(key.to_string(), value);
            }
        };

        set("sink.base_url", self.sink_base_url.clone());
        set("sink.api_key", self.api_key.clone());
        set("source.base_url", self.source_url.clone());
        set("pool.concurrency", self.concurrency.map(|n| n.to_string()));
        set("retry.max_attempts", self.max_attempts.map(|n| n.to_string()));

        overrides
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.log_format);
    setup_panic_handler();

    info!(version = env!("CARGO_PKG_VERSION"), "starting gemsync");

    // Machine-readable logs get uncolored output too
    let output = match cli.log_format {
        LogFormat::Text => Output::detect(),
        LogFormat::Json => Output::plain(),
    };

    match run_cli(cli) {
        Ok(report) => {
            println!("{}", output.summary(&report));
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error_message = %e, "sync aborted");
            eprintln!("{}", output.error(&e));
            ExitCode::FAILURE
        }
    }
}

fn run_cli(cli: Cli) -> anyhow::Result<SyncReport> {
    let rt = tokio::runtime::Runtime::new().context("failed to create async runtime")?;
    rt.block_on(sync(cli))
}

async fn sync(cli: Cli) -> anyhow::Result<SyncReport> {
    let cwd = Utf8PathBuf::try_from(std::env::current_dir()?)
        .context("working directory is not valid UTF-8")?;

    let (file_config, origin) = ConfigLoader::new(cwd).load(cli.config.as_deref()).await?;
    debug!(?origin, "configuration file layer loaded");

    let config = ConfigLayering::merge_configs(
        file_config,
        ConfigLayering::collect_env_overrides(),
        cli.overrides(),
    )?;
    let (sink_url, api_key) = config.sink_credentials()?;

    let http = http_config(&config);
    let source = RubyGemsClient::with_config(&config.source.base_url, &http)?;
    let sink = BestGemsClient::new(sink_url, api_key, &http)?;

    info!(
        source = %source.base_url(),
        sink = %sink.base_url(),
        concurrency = config.pool.concurrency,
        max_attempts = config.retry.max_attempts,
        "syncing catalog"
    );

    let driver = SyncDriver::new(Arc::new(source), Arc::new(sink), pipeline_config(&config));
    Ok(driver.run().await?)
}

fn http_config(config: &SyncConfig) -> HttpConfig {
    let defaults = HttpConfig::default();
    HttpConfig {
        timeout: Duration::from_secs(config.http.timeout_secs),
        user_agent: config.http.user_agent.clone().unwrap_or(defaults.user_agent),
        ..defaults
    }
}

fn pipeline_config(config: &SyncConfig) -> PipelineConfig {
    PipelineConfig {
        concurrency: config.pool.concurrency,
        retry: RetryConfig {
            max_attempts: config.retry.max_attempts,
            initial_delay: Duration::from_millis(config.retry.initial_delay_ms),
            max_delay: Duration::from_millis(config.retry.max_delay_ms),
            multiplier: config.retry.multiplier,
        },
    }
}

fn setup_logging(verbose: bool, format: LogFormat) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("gemsync={}", level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.with_target(false).init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        error!(event = "panic", "gemsync panicked: {}", panic_info);
        default_hook(panic_info);
    }));
}
