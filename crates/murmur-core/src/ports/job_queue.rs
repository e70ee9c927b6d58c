//! Job queue port. Fan-out and notification work runs here, after the write
//! that caused it has committed.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    /// Routing name, e.g. `fan_out_post`.
    pub kind: String,
    pub payload: serde_json::Value,
    pub enqueued_at: DateTime<Utc>,
}

impl Job {
    pub fn new(kind: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind: kind.into(),
            payload,
            enqueued_at: Utc::now(),
        }
    }
}

/// Jobs run once. Derived work that fails is logged and dropped.
#[derive(Debug)]
pub enum JobResult {
    Success,
    Failed(String),
}

pub type JobHandler =
    Box<dyn Fn(Job) -> Pin<Box<dyn Future<Output = JobResult> + Send>> + Send + Sync>;

#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job: Job) -> Result<(), JobQueueError>;

    /// Spawns the workers. Call once per queue.
    async fn start_worker(&self, handler: JobHandler) -> Result<(), JobQueueError>;

    async fn stats(&self) -> Result<QueueStats, JobQueueError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub pending: usize,
    pub running: usize,
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum JobQueueError {
    #[error("job queue is full")]
    Full,

    #[error("job queue closed: {0}")]
    Closed(String),
}
