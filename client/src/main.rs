//! SpeedHub - speed test and weather dashboard
//!
//! Runs a simulated speed test next to weather, network, ping and data usage
//! panels, then prints the dashboard.

mod config;
mod dashboard;
mod output;
mod providers;
mod storage;

use anyhow::{Context, Result};
use clap::Parser;
use speedhub_core::{CacheStore, DataPipeline, MemoryStore, Sequencer, TtlCache};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "speedhub")]
#[command(version)]
#[command(about = "Speed test and weather dashboard", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "speedhub.conf")]
    config: PathBuf,

    /// Print the final dashboard as JSON
    #[arg(long)]
    json: bool,

    /// Skip the speed test, only show the panels
    #[arg(long)]
    skip_test: bool,

    /// Drop cached IP and weather lookups before starting
    #[arg(long)]
    clear_cache: bool,

    /// Keep the cache in memory instead of the cache database
    #[arg(long)]
    no_cache_file: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_exists = args.config.exists();
    let config = config::Config::load_or_default(&args.config)?;

    // Initialize tracing (stderr, so --json output stays parseable)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("SpeedHub v{}", env!("CARGO_PKG_VERSION"));
    if config_exists {
        info!("Loaded configuration from {:?}", args.config);
    } else {
        warn!("No configuration at {:?}, using defaults", args.config);
    }

    if args.no_cache_file {
        run(&config, &args, MemoryStore::new()).await
    } else {
        let store = storage::SqliteStore::open(&config.general.cache_path)
            .with_context(|| format!("Cache database: {}", config.general.cache_path))?;
        run(&config, &args, store).await
    }
}

async fn run<S: CacheStore>(config: &config::Config, args: &Args, store: S) -> Result<()> {
    if args.clear_cache {
        store.clear().context("Failed to clear cache")?;
        info!("Cache cleared");
    }

    let http = providers::build_http_client(config.http_timeout())?;

    let api_key = config.weather_api_key();
    if api_key.is_none() {
        warn!(
            "{} is not set, weather will not be refreshed",
            config.weather.api_key_env
        );
    }

    let pipeline = DataPipeline::new(
        providers::IpApiClient::new(http.clone(), &config.endpoints.ip_lookup_url),
        providers::OpenWeatherClient::new(
            http,
            &config.endpoints.weather_url,
            api_key,
            &config.weather.api_key_env,
        ),
        TtlCache::new(store),
    );
    let sequencer = Sequencer::new(config.test_duration());

    let format = if args.json {
        output::OutputFormat::Json
    } else {
        output::OutputFormat::Human
    };
    let output = output::OutputManager::new(format);

    let state = dashboard::Dashboard::new(&pipeline, &sequencer, &output)
        .run(!args.skip_test)
        .await;

    output.finish(&state)
}
