//! Rate limiting.

mod memory;

pub use memory::{InMemoryRateLimiter, RateLimitConfig};
