use crate::processor::alert_engine::AlertEngine;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

/// Runs one pass per tick until Ctrl-C. Each pass is awaited before the next
/// tick is taken, so passes never overlap; a slow pass delays the next one.
pub async fn run_alert_checks(engine: &AlertEngine, period: Duration) -> anyhow::Result<()> {
    info!("Checking search alerts every {} seconds", period.as_secs());

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => run_once(engine).await,
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("Shutdown requested, stopping alert checks");
                return Ok(());
            }
        }
    }
}

pub async fn run_once(engine: &AlertEngine) {
    match engine.run_pass().await {
        Ok(report) => info!(
            completed = report.completed,
            expired = report.expired,
            failed = report.failed,
            pending = report.pending,
            skipped = report.skipped,
            errors = report.errors,
            queries = report.queries,
            "Search alert pass finished"
        ),
        // Nothing was changed; the next tick retries.
        Err(e) => error!("Error processing search alerts: {}", e),
    }
}
