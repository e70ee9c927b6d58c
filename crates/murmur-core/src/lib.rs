//! # Murmur Core
//!
//! The domain layer of the Murmur social backend.
//! This crate holds the business rules (toggles, timeline fan-out, notification
//! aggregation) and the ports they run against. It has no infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use error::DomainError;
pub use service::{BackgroundTask, Repositories, SocialService};
