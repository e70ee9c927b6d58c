//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod job_queue;
mod live;
mod rate_limit;
mod repository;

pub use auth::{AuthError, TokenClaims, TokenService};
pub use job_queue::{Job, JobHandler, JobQueue, JobQueueError, JobResult, QueueStats};
pub use live::{LiveError, LivePublisher};
pub use rate_limit::{RateLimitError, RateLimitResult, RateLimiter};
pub use repository::{
    CommentRepository, NotificationRepository, PostRepository, RelationshipStore, UserRepository,
};
