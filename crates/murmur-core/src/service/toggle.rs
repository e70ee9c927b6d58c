//! Toggle/counter engine: follows, post likes and comment likes.

use crate::domain::{CommentId, PostId, RelationshipKind, ToggleOutcome, UserId};
use crate::error::DomainError;

use super::{require, BackgroundTask, SocialService};

/// How many times a toggle that lost a uniqueness race is attempted in total.
pub const MAX_TOGGLE_ATTEMPTS: u32 = 3;

impl SocialService {
    pub async fn toggle_follow(
        &self,
        viewer: Option<UserId>,
        followee_id: UserId,
    ) -> Result<ToggleOutcome, DomainError> {
        let follower_id = require(viewer)?;
        if follower_id == followee_id {
            return Err(DomainError::Forbidden("cannot follow yourself".to_string()));
        }

        let outcome = self
            .toggle(RelationshipKind::Follow, follower_id, followee_id)
            .await?;

        if outcome.active {
            self.dispatch(BackgroundTask::NotifyFollow {
                follower_id,
                followee_id,
            })
            .await;
        }
        Ok(outcome)
    }

    /// Resolves `handle` and toggles the follow on the resulting user.
    pub async fn toggle_follow_handle(
        &self,
        viewer: Option<UserId>,
        handle: &str,
    ) -> Result<ToggleOutcome, DomainError> {
        require(viewer)?;
        let followee = self
            .repos
            .users
            .find_by_handle(handle)
            .await?
            .ok_or_else(|| DomainError::not_found("user", handle))?;

        self.toggle_follow(viewer, followee.id).await
    }

    pub async fn toggle_post_like(
        &self,
        viewer: Option<UserId>,
        post_id: PostId,
    ) -> Result<ToggleOutcome, DomainError> {
        let user_id = require(viewer)?;
        self.toggle(RelationshipKind::PostLike, user_id, post_id).await
    }

    pub async fn toggle_comment_like(
        &self,
        viewer: Option<UserId>,
        comment_id: CommentId,
    ) -> Result<ToggleOutcome, DomainError> {
        let user_id = require(viewer)?;
        self.toggle(RelationshipKind::CommentLike, user_id, comment_id)
            .await
    }

    /// A lost race (the edge was inserted or deleted by a concurrent toggle after it
    /// was read) re-runs the whole toggle against the new state.
    async fn toggle(
        &self,
        kind: RelationshipKind,
        actor: UserId,
        target: i64,
    ) -> Result<ToggleOutcome, DomainError> {
        let mut attempt = 1;
        loop {
            match self.repos.relationships.toggle(kind, actor, target).await {
                Ok(state) => {
                    let outcome = ToggleOutcome::from(state);
                    tracing::debug!(
                        kind = ?kind,
                        actor,
                        target,
                        active = outcome.active,
                        count = outcome.count,
                        "Relationship toggled"
                    );
                    return Ok(outcome);
                }
                Err(e) if e.is_lost_race() && attempt < MAX_TOGGLE_ATTEMPTS => {
                    tracing::debug!(kind = ?kind, actor, target, attempt, "Toggle raced, retrying");
                    attempt += 1;
                }
                Err(e) if e.is_lost_race() => {
                    tracing::warn!(kind = ?kind, actor, target, "Toggle kept conflicting");
                    return Err(DomainError::Conflict(format!(
                        "concurrent updates on {} {target}",
                        kind.target_entity()
                    )));
                }
                Err(e) => return Err(e.or_not_found(kind.target_entity(), target)),
            }
        }
    }
}
