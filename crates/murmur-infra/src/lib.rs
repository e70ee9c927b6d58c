//! # Murmur Infrastructure
//!
//! Concrete implementations of the ports defined in `murmur-core`:
//! the PostgreSQL and in-memory stores, the background job queue, the live subscriber
//! registry, JWT tokens and rate limiting.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external services, in-memory only
//! - `postgres` - PostgreSQL store via SeaORM
//! - `auth` - JWT authentication
//! - `rate-limit` - Keyed rate limiting via governor
//! - `redis` - Redis relay for live events across instances

pub mod database;
pub mod jobs;
pub mod live;

#[cfg(feature = "auth")]
pub mod auth;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

// Re-exports - In-Memory
pub use database::{DatabaseConfig, InMemorySocialStore};
pub use jobs::{InMemoryJobQueue, InMemoryJobQueueConfig};
pub use live::{LiveRegistry, Subscription};

#[cfg(feature = "postgres")]
pub use database::PostgresStore;

#[cfg(feature = "auth")]
pub use auth::{JwtConfig, JwtTokenService};

#[cfg(feature = "rate-limit")]
pub use rate_limit::{InMemoryRateLimiter, RateLimitConfig};

// Re-exports - Redis
#[cfg(feature = "redis")]
pub use live::{RedisConfig, RedisLiveRelay};
