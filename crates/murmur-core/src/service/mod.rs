//! Social services.
//!
//! [`SocialService`] owns the write paths (toggles, publishing, commenting), the
//! readers that decorate stored rows for a viewer, and the background tasks that keep
//! timelines and notifications in step with the graph. Writes commit first; the derived
//! work is queued as a [`BackgroundTask`] and runs on the job queue's worker pool.

mod comments;
mod notifications;
mod timeline;
mod toggle;
mod users;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::{Audience, CommentId, LiveEvent, NotificationEvent, PostId, User, UserId};
use crate::error::DomainError;
use crate::ports::{
    CommentRepository, Job, JobHandler, JobQueue, JobResult, LivePublisher,
    NotificationRepository, PostRepository, RelationshipStore, UserRepository,
};

pub use toggle::MAX_TOGGLE_ATTEMPTS;

/// The store-facing ports the services run against.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub relationships: Arc<dyn RelationshipStore>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
}

impl Repositories {
    /// Uses one store for every port.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: UserRepository
            + RelationshipStore
            + PostRepository
            + CommentRepository
            + NotificationRepository
            + 'static,
    {
        Self {
            users: store.clone(),
            relationships: store.clone(),
            posts: store.clone(),
            comments: store.clone(),
            notifications: store,
        }
    }
}

/// Work that runs after a write has committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum BackgroundTask {
    /// Copy a post into every follower's timeline and notify mentioned users.
    FanOutPost { post_id: PostId },
    /// Tell a user about a new follower.
    NotifyFollow {
        follower_id: UserId,
        followee_id: UserId,
    },
    /// Push a comment to the post's subscribers and notify them.
    CommentCreated { comment_id: CommentId },
}

impl BackgroundTask {
    pub fn kind(&self) -> &'static str {
        match self {
            BackgroundTask::FanOutPost { .. } => "fan_out_post",
            BackgroundTask::NotifyFollow { .. } => "notify_follow",
            BackgroundTask::CommentCreated { .. } => "comment_created",
        }
    }
}

pub struct SocialService {
    repos: Repositories,
    live: Arc<dyn LivePublisher>,
    jobs: Arc<dyn JobQueue>,
}

impl SocialService {
    pub fn new(repos: Repositories, live: Arc<dyn LivePublisher>, jobs: Arc<dyn JobQueue>) -> Self {
        Self { repos, live, jobs }
    }

    /// Handler to give to [`JobQueue::start_worker`].
    pub fn job_handler(self: Arc<Self>) -> JobHandler {
        Box::new(move |job: Job| -> Pin<Box<dyn Future<Output = JobResult> + Send>> {
            let service = self.clone();
            Box::pin(async move { service.run_job(job).await })
        })
    }

    /// Runs one queued job. Failures are reported as [`JobResult::Failed`]: derived
    /// work is best-effort and never retried.
    pub async fn run_job(&self, job: Job) -> JobResult {
        let task: BackgroundTask = match serde_json::from_value(job.payload) {
            Ok(task) => task,
            Err(e) => return JobResult::Failed(format!("malformed payload: {e}")),
        };

        match self.run_task(task).await {
            Ok(()) => JobResult::Success,
            Err(e) => JobResult::Failed(e.to_string()),
        }
    }

    pub async fn run_task(&self, task: BackgroundTask) -> Result<(), DomainError> {
        match task {
            BackgroundTask::FanOutPost { post_id } => self.fan_out_post(post_id).await,
            BackgroundTask::NotifyFollow {
                follower_id,
                followee_id,
            } => self.notify_follow(follower_id, followee_id).await,
            BackgroundTask::CommentCreated { comment_id } => {
                self.comment_created(comment_id).await
            }
        }
    }

    /// Queues derived work. The write it follows has already committed, so a queue
    /// failure is logged and swallowed.
    async fn dispatch(&self, task: BackgroundTask) {
        let payload = match serde_json::to_value(&task) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, task = ?task, "Failed to encode background task");
                return;
            }
        };

        let job = Job::new(task.kind(), payload);
        let job_id = job.id.clone();
        if let Err(e) = self.jobs.enqueue(job).await {
            tracing::error!(error = %e, task = ?task, "Failed to enqueue background task");
        } else {
            tracing::debug!(job_id = %job_id, task = ?task, "Background task queued");
        }
    }

    async fn push(&self, user_id: UserId, event: LiveEvent) {
        if let Err(e) = self.live.publish(user_id, event).await {
            tracing::warn!(user_id, error = %e, "Live push failed");
        }
    }

    /// Runs the aggregator for `event` and pushes every touched notification.
    async fn notify(&self, audience: Audience, event: NotificationEvent) -> Result<(), DomainError> {
        let touched = self.repos.notifications.notify(&audience, &event).await?;
        tracing::debug!(
            kind = %event.kind,
            actor_id = event.actor_id,
            recipients = touched.len(),
            "Notifications issued"
        );

        for notification in touched {
            self.push(notification.user_id, LiveEvent::Notification(notification))
                .await;
        }
        Ok(())
    }

    async fn current_user(&self, user_id: UserId) -> Result<User, DomainError> {
        self.repos
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("user", user_id))
    }
}

/// The authenticated caller, or [`DomainError::Unauthenticated`].
fn require(viewer: Option<UserId>) -> Result<UserId, DomainError> {
    viewer.ok_or(DomainError::Unauthenticated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_payload_round_trip() {
        let task = BackgroundTask::NotifyFollow {
            follower_id: 1,
            followee_id: 2,
        };
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["task"], "notify_follow");
        assert_eq!(serde_json::from_value::<BackgroundTask>(value).unwrap(), task);
    }

    #[test]
    fn test_task_kinds() {
        assert_eq!(
            BackgroundTask::FanOutPost { post_id: 1 }.kind(),
            "fan_out_post"
        );
        assert_eq!(
            BackgroundTask::CommentCreated { comment_id: 1 }.kind(),
            "comment_created"
        );
    }

    #[test]
    fn test_require_rejects_anonymous() {
        assert!(matches!(require(None), Err(DomainError::Unauthenticated)));
        assert_eq!(require(Some(4)).unwrap(), 4);
    }
}
