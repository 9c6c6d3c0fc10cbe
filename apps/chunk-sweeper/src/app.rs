//! Sweep scheduling.

use std::sync::Arc;
use std::time::Duration;

use chunk_upload_storage::{RetentionSweeper, SweepReport};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::Config;

/// Runs the sweeper until shutdown is requested, or a single sweep when
/// `once` is set or scheduling is disabled.
pub async fn run(config: Config, once: bool) -> anyhow::Result<()> {
    let registry = config.upload_registry()?;
    tracing::info!(
        protocols = ?registry.active().map(|kind| kind.name()).collect::<Vec<_>>(),
        "upload protocols configured"
    );

    let sweeper = Arc::new(RetentionSweeper::new(config.chunk_storage()?));

    if once || !config.clear.schedule.enabled {
        let report = sweeper.run_blocking().await?;
        log_report(&report);
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let period = Duration::from_secs(config.clear.schedule.interval_secs);
    let sweeps = tokio::spawn(sweep_every(sweeper, period, cancel.clone()));
    tracing::info!(interval_secs = period.as_secs(), "sweep scheduled");

    tokio::signal::ctrl_c().await?;
    tracing::info!("received Ctrl+C, shutting down");

    cancel.cancel();
    sweeps.await?;
    Ok(())
}

/// Sweeps immediately and then every `period` until `cancel` fires.
async fn sweep_every(sweeper: Arc<RetentionSweeper>, period: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                match Arc::clone(&sweeper).run_blocking().await {
                    Ok(report) => log_report(&report),
                    Err(e) => tracing::error!(error = %e, "chunk sweep failed"),
                }
            }
        }
    }
}

fn log_report(report: &SweepReport) {
    if report.is_clean() {
        tracing::debug!(found = report.found, deleted = report.deleted, "sweep finished");
    } else {
        tracing::warn!(
            deleted = report.deleted,
            failures = ?report.failures,
            "sweep finished with failures"
        );
    }
}
