//! Named cron jobs on top of tokio-cron-scheduler.

use std::future::Future;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

pub struct Scheduler {
    inner: JobScheduler,
    enabled: bool,
    registered: Vec<&'static str>,
}

impl Scheduler {
    /// `SCHEDULER_ENABLED=false` (or `0`) keeps the jobs registered but never starts them.
    pub async fn from_env() -> Result<Self, JobSchedulerError> {
        let enabled = std::env::var("SCHEDULER_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);
        Ok(Self {
            inner: JobScheduler::new().await?,
            enabled,
            registered: Vec::new(),
        })
    }

    /// Runs `task` on `schedule`. Schedules carry a leading seconds field.
    pub async fn every<F, Fut>(
        &mut self,
        name: &'static str,
        schedule: &str,
        task: F,
    ) -> Result<(), JobSchedulerError>
    where
        F: Fn() -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let job = Job::new_async(schedule, move |_id, _lock| {
            let task = task.clone();
            Box::pin(async move { task().await })
        })?;
        let id = self.inner.add(job).await?;

        self.registered.push(name);
        tracing::info!(job = name, schedule = %schedule, job_id = %id, "Maintenance job registered");
        Ok(())
    }

    pub async fn start(&self) -> Result<(), JobSchedulerError> {
        if !self.enabled {
            tracing::info!(jobs = ?self.registered, "Scheduler disabled");
            return Ok(());
        }

        self.inner.start().await?;
        tracing::info!(jobs = ?self.registered, "Scheduler started");
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), JobSchedulerError> {
        self.inner.shutdown().await?;
        tracing::info!("Scheduler stopped");
        Ok(())
    }
}
