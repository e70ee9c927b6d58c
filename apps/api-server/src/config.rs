//! Application configuration loaded from environment variables.

use std::env;

use murmur_infra::database::DatabaseConfig;
use murmur_infra::{InMemoryJobQueueConfig, JwtConfig};

#[cfg(feature = "rate-limit")]
use murmur_infra::RateLimitConfig;

#[cfg(feature = "redis")]
use murmur_infra::RedisConfig;

/// Default bound of each live subscriber's queue.
const DEFAULT_LIVE_QUEUE_CAPACITY: usize = 32;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs the in-memory store.
    pub database: Option<DatabaseConfig>,
    pub jwt: JwtConfig,
    pub jobs: InMemoryJobQueueConfig,
    pub live_queue_capacity: usize,
    #[cfg(feature = "rate-limit")]
    pub rate_limit: RateLimitConfig,
    /// `None` keeps live delivery local to this instance.
    #[cfg(feature = "redis")]
    pub redis: Option<RedisConfig>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            database: DatabaseConfig::from_env(),
            jwt: JwtConfig::from_env(),
            jobs: InMemoryJobQueueConfig::from_env(),
            live_queue_capacity: env::var("LIVE_QUEUE_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|capacity| *capacity > 0)
                .unwrap_or(DEFAULT_LIVE_QUEUE_CAPACITY),
            #[cfg(feature = "rate-limit")]
            rate_limit: RateLimitConfig::from_env(),
            #[cfg(feature = "redis")]
            redis: RedisConfig::from_env(),
        }
    }

    /// In-memory everything, used by handler tests.
    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            database: None,
            jwt: JwtConfig::default(),
            jobs: InMemoryJobQueueConfig::default(),
            live_queue_capacity: DEFAULT_LIVE_QUEUE_CAPACITY,
            #[cfg(feature = "rate-limit")]
            rate_limit: RateLimitConfig::default(),
            #[cfg(feature = "redis")]
            redis: None,
        }
    }
}
