//! Background worker pool.

mod memory;

pub use memory::{InMemoryJobQueue, InMemoryJobQueueConfig};
