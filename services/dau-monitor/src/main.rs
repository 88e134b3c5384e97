//! DAU Monitor CLI
//!
//! Command-line interface for the daily active user polling and reporting service.

use std::path::PathBuf;

use clap::Parser;
use dau_monitor::{load_config, Config};
use tracing::Level;

#[derive(Parser)]
#[command(name = "dau-monitor")]
#[command(about = "Daily active user polling and reporting service")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen port (overrides config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, port={:?}, log_level={:?}",
        args.config,
        args.port,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    if let Some(port) = args.port {
        config.server.port = port;
    }

    tracing::info!("Starting DAU monitor");
    tracing::debug!(
        "Fetch timeout: {}s, attempts per site: {}, backoff unit: {}ms",
        config.fetch.timeout_seconds,
        config.fetch.max_retries,
        config.fetch.backoff_unit_ms
    );

    dau_monitor::run(config).await?;

    Ok(())
}
