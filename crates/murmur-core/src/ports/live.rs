//! Live push port.

use async_trait::async_trait;

use crate::domain::{LiveEvent, UserId};

/// Delivers events to a user's connected clients. Delivery is best-effort.
#[async_trait]
pub trait LivePublisher: Send + Sync {
    async fn publish(&self, user_id: UserId, event: LiveEvent) -> Result<(), LiveError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LiveError {
    #[error("Failed to encode event: {0}")]
    Encode(String),

    #[error("Relay error: {0}")]
    Relay(String),
}
