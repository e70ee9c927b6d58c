//! Periodic maintenance: live/queue statistics and limiter pruning.

mod scheduler;

use std::sync::Arc;

use murmur_core::ports::JobQueue;
use murmur_infra::LiveRegistry;
use tokio_cron_scheduler::JobSchedulerError;

#[cfg(feature = "rate-limit")]
use murmur_infra::InMemoryRateLimiter;

pub use scheduler::Scheduler;

const STATS_SCHEDULE: &str = "0 */5 * * * *";
#[cfg(feature = "rate-limit")]
const PRUNE_SCHEDULE: &str = "30 * * * * *";

/// Handles the maintenance jobs run against.
pub struct Maintenance {
    pub live: Arc<LiveRegistry>,
    pub jobs: Arc<dyn JobQueue>,
    #[cfg(feature = "rate-limit")]
    pub limiter: Arc<InMemoryRateLimiter>,
}

/// Register the maintenance jobs and start the scheduler.
pub async fn start(maintenance: Maintenance) -> Result<Scheduler, JobSchedulerError> {
    let mut scheduler = Scheduler::from_env().await?;

    let live = maintenance.live.clone();
    let jobs = maintenance.jobs.clone();
    scheduler
        .every("stats", STATS_SCHEDULE, move || {
            let live = live.clone();
            let jobs = jobs.clone();
            async move { log_stats(&live, jobs.as_ref()).await }
        })
        .await?;

    #[cfg(feature = "rate-limit")]
    {
        let limiter = maintenance.limiter.clone();
        scheduler
            .every("prune_rate_limits", PRUNE_SCHEDULE, move || {
                let limiter = limiter.clone();
                async move {
                    limiter.prune();
                    tracing::debug!("Rate limiter state pruned");
                }
            })
            .await?;
    }

    scheduler.start().await?;
    Ok(scheduler)
}

async fn log_stats(live: &LiveRegistry, jobs: &dyn JobQueue) {
    match jobs.stats().await {
        Ok(stats) => tracing::info!(
            live_users = live.users(),
            pending = stats.pending,
            running = stats.running,
            succeeded = stats.succeeded,
            failed = stats.failed,
            "Background stats"
        ),
        Err(e) => tracing::warn!(error = %e, "Failed to read job queue stats"),
    }
}
