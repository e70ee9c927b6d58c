//! In-memory job queue.
//!
//! A bounded channel drained by a fixed pool of tokio workers. Fan-out and notification
//! jobs run here after the request that caused them has committed.
//! Note: Jobs are lost on server restart.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use murmur_core::ports::{Job, JobHandler, JobQueue, JobQueueError, JobResult, QueueStats};

#[derive(Debug, Clone)]
pub struct InMemoryJobQueueConfig {
    /// Maximum pending jobs (0 = bounded only by the channel).
    pub max_size: usize,
    /// Number of worker tasks.
    pub workers: usize,
}

impl Default for InMemoryJobQueueConfig {
    fn default() -> Self {
        Self {
            max_size: 10000,
            workers: 4,
        }
    }
}

impl InMemoryJobQueueConfig {
    pub fn from_env() -> Self {
        Self {
            max_size: std::env::var("JOB_QUEUE_MAX_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10000),
            workers: std::env::var("JOB_QUEUE_WORKERS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(4),
        }
    }
}

#[derive(Default)]
struct JobStats {
    pending: AtomicUsize,
    running: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
}

pub struct InMemoryJobQueue {
    stats: Arc<JobStats>,
    config: InMemoryJobQueueConfig,
    sender: mpsc::Sender<Job>,
    receiver: Arc<Mutex<mpsc::Receiver<Job>>>,
}

impl InMemoryJobQueue {
    pub fn new(config: InMemoryJobQueueConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.max_size.max(100));

        Self {
            stats: Arc::new(JobStats::default()),
            config,
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
        }
    }

    pub fn from_env() -> Self {
        Self::new(InMemoryJobQueueConfig::from_env())
    }
}

struct Worker {
    id: usize,
    handler: Arc<JobHandler>,
    receiver: Arc<Mutex<mpsc::Receiver<Job>>>,
    stats: Arc<JobStats>,
}

impl Worker {
    async fn run(self) {
        tracing::info!(worker = self.id, "Job worker started");

        loop {
            let job = {
                let mut rx = self.receiver.lock().await;
                rx.recv().await
            };
            let Some(job) = job else {
                tracing::info!(worker = self.id, "Job worker shutting down");
                break;
            };

            self.stats.pending.fetch_sub(1, Ordering::Relaxed);
            self.stats.running.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                worker = self.id,
                job_id = %job.id,
                kind = %job.kind,
                "Processing job"
            );

            let result = (self.handler)(job.clone()).await;
            self.stats.running.fetch_sub(1, Ordering::Relaxed);
            self.settle(job, result);
        }
    }

    fn settle(&self, job: Job, result: JobResult) {
        match result {
            JobResult::Success => {
                self.stats.succeeded.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(job_id = %job.id, "Job succeeded");
            }
            JobResult::Failed(reason) => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                tracing::error!(
                    job_id = %job.id,
                    kind = %job.kind,
                    reason = %reason,
                    "Job failed"
                );
            }
        }
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue(&self, job: Job) -> Result<(), JobQueueError> {
        if self.config.max_size > 0
            && self.stats.pending.load(Ordering::Relaxed) >= self.config.max_size
        {
            return Err(JobQueueError::Full);
        }

        self.stats.pending.fetch_add(1, Ordering::Relaxed);
        if let Err(e) = self.sender.send(job).await {
            self.stats.pending.fetch_sub(1, Ordering::Relaxed);
            return Err(JobQueueError::Closed(e.to_string()));
        }

        tracing::debug!(
            pending = self.stats.pending.load(Ordering::Relaxed),
            "Job enqueued"
        );
        Ok(())
    }

    async fn start_worker(&self, handler: JobHandler) -> Result<(), JobQueueError> {
        let handler = Arc::new(handler);

        for id in 0..self.config.workers.max(1) {
            let worker = Worker {
                id,
                handler: handler.clone(),
                receiver: self.receiver.clone(),
                stats: self.stats.clone(),
            };
            tokio::spawn(worker.run());
        }

        Ok(())
    }

    async fn stats(&self) -> Result<QueueStats, JobQueueError> {
        Ok(QueueStats {
            pending: self.stats.pending.load(Ordering::Relaxed),
            running: self.stats.running.load(Ordering::Relaxed),
            succeeded: self.stats.succeeded.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    fn handler<F>(f: F) -> JobHandler
    where
        F: Fn(Job) -> JobResult + Send + Sync + 'static,
    {
        Box::new(move |job: Job| -> Pin<Box<dyn Future<Output = JobResult> + Send>> {
            let result = f(job);
            Box::pin(async move { result })
        })
    }

    async fn wait_for<F: Fn(&QueueStats) -> bool>(queue: &InMemoryJobQueue, done: F) -> QueueStats {
        for _ in 0..100 {
            let stats = queue.stats().await.unwrap();
            if done(&stats) {
                return stats;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        queue.stats().await.unwrap()
    }

    #[tokio::test]
    async fn test_jobs_are_processed() {
        let queue = InMemoryJobQueue::new(InMemoryJobQueueConfig {
            max_size: 10,
            workers: 2,
        });
        queue
            .start_worker(handler(|_| JobResult::Success))
            .await
            .unwrap();

        for _ in 0..3 {
            queue
                .enqueue(Job::new("noop", serde_json::Value::Null))
                .await
                .unwrap();
        }

        let stats = wait_for(&queue, |s| s.succeeded == 3).await;
        assert_eq!(stats.succeeded, 3);
        assert_eq!(stats.pending, 0);
    }

    #[tokio::test]
    async fn test_failed_jobs_are_not_retried() {
        let queue = InMemoryJobQueue::new(InMemoryJobQueueConfig {
            max_size: 10,
            workers: 1,
        });
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        queue
            .start_worker(handler(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                JobResult::Failed("boom".to_string())
            }))
            .await
            .unwrap();

        queue
            .enqueue(Job::new("explode", serde_json::Value::Null))
            .await
            .unwrap();

        let stats = wait_for(&queue, |s| s.failed == 1).await;
        assert_eq!(stats.failed, 1);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_queue_full() {
        let queue = InMemoryJobQueue::new(InMemoryJobQueueConfig {
            max_size: 1,
            workers: 1,
        });

        queue
            .enqueue(Job::new("first", serde_json::Value::Null))
            .await
            .unwrap();
        let result = queue.enqueue(Job::new("second", serde_json::Value::Null)).await;

        assert!(matches!(result, Err(JobQueueError::Full)));
    }
}
