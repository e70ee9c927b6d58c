//! Repository ports over the graph & content store.
//!
//! Every write method runs as one transaction in the backing store. Uniqueness and
//! foreign-key failures come back as [`RepoError::UniqueViolation`] and
//! [`RepoError::ForeignKeyViolation`] so callers can tell races from missing targets.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::domain::{
    Audience, Authored, BackwardPage, Comment, CommentId, ForwardPage, NewComment, NewPost,
    NewUser, Notification, NotificationEvent, NotificationId, Post, PostId, RelationshipKind,
    TimelineItem, ToggleState, User, UserId,
};
use crate::error::RepoError;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<User, RepoError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepoError>;

    async fn find_by_handle(&self, handle: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// Users whose handle starts with `query` (all users when `None`), by handle.
    async fn search(&self, query: Option<&str>, page: &ForwardPage)
        -> Result<Vec<User>, RepoError>;

    async fn followers(&self, user_id: UserId, page: &ForwardPage)
        -> Result<Vec<User>, RepoError>;

    async fn followees(&self, user_id: UserId, page: &ForwardPage)
        -> Result<Vec<User>, RepoError>;
}

/// Toggleable edges and their denormalized counters.
#[async_trait]
pub trait RelationshipStore: Send + Sync {
    /// Flips the edge `actor -> target` and moves the counters with it, in one transaction.
    /// The counters move only by rows actually inserted or deleted: a delete that finds
    /// nothing fails with [`RepoError::StaleRead`] and leaves the counters untouched.
    async fn toggle(
        &self,
        kind: RelationshipKind,
        actor: UserId,
        target: i64,
    ) -> Result<ToggleState, RepoError>;

    /// Which of `targets` the actor has an active edge to.
    async fn active_targets(
        &self,
        kind: RelationshipKind,
        actor: UserId,
        targets: &[i64],
    ) -> Result<HashSet<i64>, RepoError>;

    /// Which of `actors` have an active edge to the target.
    async fn active_actors(
        &self,
        kind: RelationshipKind,
        target: i64,
        actors: &[UserId],
    ) -> Result<HashSet<UserId>, RepoError>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Stores the post, its author's timeline item and the author's subscription.
    async fn publish(&self, post: NewPost) -> Result<(Post, TimelineItem), RepoError>;

    async fn find_by_id(&self, id: PostId) -> Result<Option<Authored<Post>>, RepoError>;

    async fn by_author(&self, author_id: UserId, page: &BackwardPage)
        -> Result<Vec<Post>, RepoError>;

    /// Inserts one timeline item per follower of the author in a single statement.
    async fn fan_out(&self, post: &Post) -> Result<Vec<TimelineItem>, RepoError>;

    async fn timeline(
        &self,
        owner: UserId,
        page: &BackwardPage,
    ) -> Result<Vec<(TimelineItem, Authored<Post>)>, RepoError>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Stores the comment, subscribes its author to the post and bumps the post counter.
    async fn create(&self, comment: NewComment) -> Result<Comment, RepoError>;

    async fn find_by_id(&self, id: CommentId) -> Result<Option<Authored<Comment>>, RepoError>;

    async fn list(
        &self,
        post_id: PostId,
        page: &BackwardPage,
    ) -> Result<Vec<Authored<Comment>>, RepoError>;

    async fn subscribers(&self, post_id: PostId) -> Result<Vec<UserId>, RepoError>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Opens or merges one notification per audience member, excluding the actor.
    /// Returns every created or updated row.
    async fn notify(
        &self,
        audience: &Audience,
        event: &NotificationEvent,
    ) -> Result<Vec<Notification>, RepoError>;

    async fn list(
        &self,
        user_id: UserId,
        page: &BackwardPage,
    ) -> Result<Vec<Notification>, RepoError>;

    /// Fails with [`RepoError::NotFound`] unless `id` belongs to `user_id`.
    async fn mark_read(&self, user_id: UserId, id: NotificationId) -> Result<(), RepoError>;

    async fn mark_all_read(&self, user_id: UserId) -> Result<u64, RepoError>;

    async fn unread_count(&self, user_id: UserId) -> Result<u64, RepoError>;
}
