//! Chunk sweeper entry point.
//!
//! Runs the retention sweep on the configured schedule, or once with
//! `--once`.

mod app;
mod cli;
mod config;

use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "starting chunk sweeper"
    );

    let config = config::Config::load(cli.config.as_deref())?;
    tracing::info!(
        root = %config.storage.root.display(),
        chunks = %config.storage.chunks,
        window = %config.clear.timestamp,
        "configuration loaded"
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(app::run(config, cli.once))?;

    tracing::info!("chunk sweeper shut down cleanly");
    Ok(())
}
