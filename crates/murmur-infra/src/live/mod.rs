//! Live subscriber registry and its cross-instance relay.

mod registry;

pub use registry::{LiveRegistry, Subscription, DEFAULT_QUEUE_CAPACITY};

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use self::redis::{RedisConfig, RedisLiveRelay};
