//! Comments: creation, listing and delivery to post subscribers.

use std::collections::HashSet;

use crate::domain::{
    extract_mentions, Audience, BackwardPage, CommentId, CommentView, LiveEvent, NewComment,
    NotificationEvent, NotificationKind, PostId, RelationshipKind, UserId,
};
use crate::error::DomainError;

use super::{require, BackgroundTask, SocialService};

impl SocialService {
    /// Stores a comment (subscribing its author to the post) and queues delivery.
    pub async fn create_comment(
        &self,
        viewer: Option<UserId>,
        post_id: PostId,
        content: &str,
    ) -> Result<CommentView, DomainError> {
        let author_id = require(viewer)?;
        let new_comment = NewComment::new(author_id, post_id, content)?;
        let author = self.current_user(author_id).await?;

        let comment = self
            .repos
            .comments
            .create(new_comment)
            .await
            .map_err(|e| e.or_not_found("post", post_id))?;

        tracing::info!(comment_id = comment.id, post_id, author_id, "Comment created");
        self.dispatch(BackgroundTask::CommentCreated {
            comment_id: comment.id,
        })
        .await;

        Ok(CommentView {
            comment,
            author: author.summary(),
            mine: true,
            liked: false,
        })
    }

    /// Pushes the comment to every subscriber of its post except the commenter, then
    /// runs the comment and mention notifications.
    pub(super) async fn comment_created(&self, comment_id: CommentId) -> Result<(), DomainError> {
        let authored = self
            .repos
            .comments
            .find_by_id(comment_id)
            .await?
            .ok_or_else(|| DomainError::not_found("comment", comment_id))?;
        let post_id = authored.item.post_id;
        let author = authored.author.clone();

        let subscribers = self.repos.comments.subscribers(post_id).await?;
        for user_id in subscribers.into_iter().filter(|id| *id != author.id) {
            let view = CommentView::new(authored.clone(), Some(user_id), false);
            self.push(user_id, LiveEvent::Comment(view)).await;
        }

        self.notify(
            Audience::PostSubscribers(post_id),
            NotificationEvent {
                kind: NotificationKind::Comment,
                actor_id: author.id,
                actor: author.handle.clone(),
                post_id: Some(post_id),
            },
        )
        .await?;

        let mentions = extract_mentions(&authored.item.content);
        if !mentions.is_empty() {
            self.notify(
                Audience::Handles(mentions),
                NotificationEvent {
                    kind: NotificationKind::Mention,
                    actor_id: author.id,
                    actor: author.handle,
                    post_id: Some(post_id),
                },
            )
            .await?;
        }
        Ok(())
    }

    pub async fn comments(
        &self,
        viewer: Option<UserId>,
        post_id: PostId,
        page: &BackwardPage,
    ) -> Result<Vec<CommentView>, DomainError> {
        if self.repos.posts.find_by_id(post_id).await?.is_none() {
            return Err(DomainError::not_found("post", post_id));
        }

        let rows = self.repos.comments.list(post_id, page).await?;
        let comment_ids: Vec<CommentId> = rows.iter().map(|row| row.item.id).collect();
        let liked: HashSet<CommentId> = match viewer {
            Some(user_id) if !comment_ids.is_empty() => {
                self.repos
                    .relationships
                    .active_targets(RelationshipKind::CommentLike, user_id, &comment_ids)
                    .await?
            }
            _ => HashSet::new(),
        };

        Ok(rows
            .into_iter()
            .map(|row| {
                let is_liked = liked.contains(&row.item.id);
                CommentView::new(row, viewer, is_liked)
            })
            .collect())
    }
}
