//! Redis relay for live events.
//!
//! Publishing goes through a Redis channel; every instance listens on it and feeds
//! received events into its own [`LiveRegistry`], so a fan-out job running on one
//! instance reaches clients connected to another.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use murmur_core::domain::{LiveEvent, UserId};
use murmur_core::ports::{LiveError, LivePublisher};

use super::LiveRegistry;

/// Redis connection configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis URL (e.g., redis://localhost:6379)
    pub url: String,
    pub connect_timeout: Duration,
    /// Channel shared by every instance.
    pub channel: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connect_timeout: Duration::from_secs(5),
            channel: "murmur:live".to_string(),
        }
    }
}

impl RedisConfig {
    /// Returns `None` when `REDIS_URL` is unset.
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("REDIS_URL").ok()?;
        Some(Self {
            url,
            connect_timeout: Duration::from_secs(
                std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
            channel: std::env::var("REDIS_LIVE_CHANNEL")
                .unwrap_or_else(|_| "murmur:live".to_string()),
        })
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    user_id: UserId,
    event: LiveEvent,
}

pub struct RedisLiveRelay {
    conn: ConnectionManager,
    channel: String,
    listener: JoinHandle<()>,
}

impl RedisLiveRelay {
    /// Connects and starts relaying channel messages into `registry`.
    pub async fn connect(config: RedisConfig, registry: Arc<LiveRegistry>) -> Result<Self, LiveError> {
        let client =
            Client::open(config.url.as_str()).map_err(|e| LiveError::Relay(e.to_string()))?;

        let conn = tokio::time::timeout(config.connect_timeout, ConnectionManager::new(client.clone()))
            .await
            .map_err(|_| LiveError::Relay("Connection timed out".to_string()))?
            .map_err(|e| LiveError::Relay(e.to_string()))?;

        let mut pubsub = tokio::time::timeout(config.connect_timeout, client.get_async_pubsub())
            .await
            .map_err(|_| LiveError::Relay("Connection timed out".to_string()))?
            .map_err(|e| LiveError::Relay(e.to_string()))?;
        pubsub
            .subscribe(&config.channel)
            .await
            .map_err(|e| LiveError::Relay(e.to_string()))?;

        tracing::info!(url = %config.url, channel = %config.channel, "Live relay connected to Redis");

        let channel = config.channel.clone();
        let listener = tokio::spawn(async move {
            let mut stream = pubsub.on_message();
            while let Some(msg) = stream.next().await {
                let payload: String = match msg.get_payload() {
                    Ok(p) => p,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to read relay payload");
                        continue;
                    }
                };
                match serde_json::from_str::<Envelope>(&payload) {
                    Ok(envelope) => {
                        registry.publish_local(envelope.user_id, &envelope.event);
                    }
                    Err(e) => tracing::warn!(error = %e, "Discarding malformed relay message"),
                }
            }
            tracing::info!(channel = %channel, "Live relay connection closed");
        });

        Ok(Self {
            conn,
            channel: config.channel,
            listener,
        })
    }
}

impl Drop for RedisLiveRelay {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

#[async_trait]
impl LivePublisher for RedisLiveRelay {
    async fn publish(&self, user_id: UserId, event: LiveEvent) -> Result<(), LiveError> {
        let payload = serde_json::to_string(&Envelope { user_id, event })
            .map_err(|e| LiveError::Encode(e.to_string()))?;

        let mut conn = self.conn.clone();
        conn.publish::<_, _, ()>(&self.channel, payload)
            .await
            .map_err(|e| LiveError::Relay(e.to_string()))
    }
}
