//! Fuse pool indexer - entry point.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Replay lending-pool events into reconciled entity snapshots.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via FUSE_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Print Prometheus metrics after the replay
    #[arg(long)]
    print_metrics: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    fuse_telemetry::init_logging()?;

    info!("Starting Fuse indexer v{}", env!("CARGO_PKG_VERSION"));

    // CLI arg > FUSE_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("FUSE_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");
    let config = fuse_indexer::AppConfig::load(&config_path)?;
    info!(
        event_log = %config.event_log.display(),
        chain_state = %config.chain_state.display(),
        "Configuration loaded"
    );

    let mut indexer = fuse_indexer::Indexer::new(config)?;
    let (summary, snapshot) = indexer.run()?;
    info!(
        processed = summary.processed,
        skipped = summary.skipped,
        snapshot = %snapshot.display(),
        "Done"
    );

    if args.print_metrics {
        println!("{}", fuse_indexer::metrics_report()?);
    }

    Ok(())
}
