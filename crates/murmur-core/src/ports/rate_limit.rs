//! Rate limiting port.

use async_trait::async_trait;
use std::time::Duration;

/// Keyed rate limiter: every key (identity or peer address) gets its own budget.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    async fn check(&self, key: &str) -> Result<RateLimitResult, RateLimitError>;
}

#[derive(Debug, Clone)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_after: Duration,
}

impl RateLimitResult {
    /// Whole seconds a rejected caller should wait, never zero.
    pub fn retry_after_secs(&self) -> u64 {
        self.reset_after.as_secs().max(1)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Backend error: {0}")]
    Backend(String),
}
