//! Periodic derivation of `completed` lessons: any booked lesson whose
//! slot has ended flips to completed. The flip is idempotent, so the
//! interval only affects how stale a listing can be.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::repository::ScheduleRepository;

pub async fn run_completed_lessons_worker(
    repo: Arc<dyn ScheduleRepository>,
    interval: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("completed-lessons worker stopping");
                return;
            }
            _ = ticker.tick() => {
                match repo.update_completed_lessons().await {
                    Ok(0) => {}
                    Ok(count) => tracing::info!(count, "marked lessons completed"),
                    Err(e) => tracing::error!(error = %e, "completed-lessons pass failed"),
                }
            }
        }
    }
}
