//! Notification aggregator entry points and readers.

use crate::domain::{
    Audience, BackwardPage, Notification, NotificationEvent, NotificationId, NotificationKind,
    UserId,
};
use crate::error::DomainError;

use super::{require, SocialService};

impl SocialService {
    pub(super) async fn notify_follow(
        &self,
        follower_id: UserId,
        followee_id: UserId,
    ) -> Result<(), DomainError> {
        let follower = self.current_user(follower_id).await?;
        self.notify(
            Audience::User(followee_id),
            NotificationEvent {
                kind: NotificationKind::Follow,
                actor_id: follower.id,
                actor: follower.handle,
                post_id: None,
            },
        )
        .await
    }

    pub async fn notifications(
        &self,
        viewer: Option<UserId>,
        page: &BackwardPage,
    ) -> Result<Vec<Notification>, DomainError> {
        let user_id = require(viewer)?;
        Ok(self.repos.notifications.list(user_id, page).await?)
    }

    pub async fn mark_notification_read(
        &self,
        viewer: Option<UserId>,
        id: NotificationId,
    ) -> Result<(), DomainError> {
        let user_id = require(viewer)?;
        self.repos
            .notifications
            .mark_read(user_id, id)
            .await
            .map_err(|e| e.or_not_found("notification", id))
    }

    /// Marks every notification of the viewer as read and returns how many changed.
    pub async fn mark_all_notifications_read(
        &self,
        viewer: Option<UserId>,
    ) -> Result<u64, DomainError> {
        let user_id = require(viewer)?;
        let updated = self.repos.notifications.mark_all_read(user_id).await?;
        tracing::debug!(user_id, updated, "Notifications marked as read");
        Ok(updated)
    }

    pub async fn unread_notifications(&self, viewer: Option<UserId>) -> Result<u64, DomainError> {
        let user_id = require(viewer)?;
        Ok(self.repos.notifications.unread_count(user_id).await?)
    }
}
