use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::ServiceError;
use crate::service::BoardService;

pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Totals for one scheduler tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub boards: usize,
    pub expired: usize,
    pub promoted: usize,
    /// Boards skipped this tick because their sweep errored or timed out.
    pub failed: usize,
    /// The board listing itself failed, so no board was swept.
    pub listing_failed: bool,
}

/// Background task that expires and promotes messages on every board.
pub struct SweepScheduler {
    service: BoardService,
    interval: Duration,
}

impl SweepScheduler {
    pub fn new(service: BoardService, interval: Duration) -> Self {
        Self { service, interval }
    }

    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Tick until `shutdown` is cancelled. A tick in progress is finished first.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Sweep scheduler running every {:?}", self.interval);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {}
            }

            let summary = self.tick(Utc::now()).await;
            debug!(
                "Sweep: {} boards, {} expired, {} promoted, {} failed",
                summary.boards, summary.expired, summary.promoted, summary.failed
            );
        }

        info!("Sweep scheduler stopped");
    }

    /// Sweep every board once, all against the same `now`. A board that
    /// fails is logged and skipped; the rest still run.
    pub async fn tick(&self, now: DateTime<Utc>) -> TickSummary {
        let mut summary = TickSummary::default();

        let ids = match self.service.board_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Sweep: failed to list boards: {}", e);
                summary.listing_failed = true;
                return summary;
            }
        };

        for id in ids {
            match self.service.sweep_board(id, now).await {
                Ok(report) => {
                    if !report.is_empty() {
                        info!(
                            "Sweep: board {} expired {} and promoted {}",
                            id,
                            report.expired.len(),
                            report.promoted.len()
                        );
                    }
                    summary.boards += 1;
                    summary.expired += report.expired.len();
                    summary.promoted += report.promoted.len();
                }
                // Deleted since listing.
                Err(ServiceError::BoardNotFound(_)) => {
                    debug!("Sweep: board {} is gone", id);
                }
                Err(e) => {
                    summary.failed += 1;
                    warn!("Sweep: board {} failed: {}", id, e);
                }
            }
        }

        summary
    }
}
