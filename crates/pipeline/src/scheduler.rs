//! Continuous mode: re-run the pipeline on an interval until shutdown

use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use common::{Error, Ticker};
use config::RunConfig;

use crate::pipeline::Pipeline;

const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Run counts for one scheduler session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub completed: u64,
    pub failed: u64,
}

/// Run `pipeline` every `run.interval_seconds` until `shutdown` fires.
///
/// A failed run is logged and the loop carries on. A run in progress when
/// shutdown arrives stops issuing new calls and is not retried.
pub async fn run_continuous(
    pipeline: &Pipeline,
    tickers: &[Ticker],
    run: &RunConfig,
    shutdown: &CancellationToken,
) -> SchedulerStats {
    let interval = run.interval().max(MIN_INTERVAL);
    info!(
        "Starting scheduler (interval={}s, run_on_startup={}, tickers={})",
        interval.as_secs(),
        run.run_on_startup,
        tickers.len()
    );

    let mut stats = SchedulerStats::default();

    if run.run_on_startup {
        info!("Running initial valuation cycle...");
        run_cycle(pipeline, tickers, shutdown, &mut stats).await;
    }

    let mut timer = tokio::time::interval(interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    timer.tick().await;

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                info!(completed = stats.completed, failed = stats.failed, "Scheduler shutting down");
                break;
            }
            _ = timer.tick() => {
                run_cycle(pipeline, tickers, shutdown, &mut stats).await;
            }
        }
    }

    stats
}

async fn run_cycle(
    pipeline: &Pipeline,
    tickers: &[Ticker],
    shutdown: &CancellationToken,
    stats: &mut SchedulerStats,
) {
    match pipeline.run_once(tickers, shutdown).await {
        Ok(_) => stats.completed += 1,
        Err(Error::Cancelled) => warn!("Valuation cycle cancelled"),
        Err(e) => {
            stats.failed += 1;
            error!("Valuation cycle failed: {}", e);
        }
    }
}
