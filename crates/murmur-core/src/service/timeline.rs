//! Timeline materializer and post readers.

use std::collections::HashSet;

use crate::domain::{
    extract_mentions, Audience, Authored, BackwardPage, LiveEvent, NewPost, NotificationEvent,
    NotificationKind, Post, PostId, PostView, RelationshipKind, TimelineEntry, UserId,
};
use crate::error::DomainError;

use super::{require, BackgroundTask, SocialService};

impl SocialService {
    /// Stores a post with the author's own timeline item, then queues the fan-out.
    pub async fn publish_post(
        &self,
        viewer: Option<UserId>,
        content: &str,
        spoiler_of: Option<&str>,
        nsfw: bool,
    ) -> Result<TimelineEntry, DomainError> {
        let author_id = require(viewer)?;
        let new_post = NewPost::new(author_id, content, spoiler_of, nsfw)?;
        let author = self.current_user(author_id).await?;

        let (post, item) = self
            .repos
            .posts
            .publish(new_post)
            .await
            .map_err(|e| e.or_not_found("user", author_id))?;

        tracing::info!(post_id = post.id, author_id, "Post published");
        self.dispatch(BackgroundTask::FanOutPost { post_id: post.id })
            .await;

        Ok(TimelineEntry {
            id: item.id,
            post: PostView {
                post,
                author: author.summary(),
                mine: true,
                liked: false,
            },
        })
    }

    /// Copies a post into every follower's timeline, pushes the new items and
    /// notifies mentioned users.
    pub(super) async fn fan_out_post(&self, post_id: PostId) -> Result<(), DomainError> {
        let authored = self
            .repos
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", post_id))?;

        let items = self.repos.posts.fan_out(&authored.item).await?;
        tracing::debug!(post_id, followers = items.len(), "Post fanned out");

        for item in items {
            let entry = TimelineEntry {
                id: item.id,
                post: PostView::new(authored.clone(), Some(item.user_id), false),
            };
            self.push(item.user_id, LiveEvent::TimelineItem(entry))
                .await;
        }

        let mentions = extract_mentions(&authored.item.content);
        if !mentions.is_empty() {
            let event = NotificationEvent {
                kind: NotificationKind::Mention,
                actor_id: authored.author.id,
                actor: authored.author.handle.clone(),
                post_id: Some(post_id),
            };
            self.notify(Audience::Handles(mentions), event).await?;
        }
        Ok(())
    }

    pub async fn timeline(
        &self,
        viewer: Option<UserId>,
        page: &BackwardPage,
    ) -> Result<Vec<TimelineEntry>, DomainError> {
        let owner = require(viewer)?;
        let rows = self.repos.posts.timeline(owner, page).await?;

        let post_ids: Vec<PostId> = rows.iter().map(|(_, authored)| authored.item.id).collect();
        let liked = self.liked_posts(viewer, &post_ids).await?;

        Ok(rows
            .into_iter()
            .map(|(item, authored)| {
                let is_liked = liked.contains(&authored.item.id);
                TimelineEntry {
                    id: item.id,
                    post: PostView::new(authored, viewer, is_liked),
                }
            })
            .collect())
    }

    pub async fn post(
        &self,
        viewer: Option<UserId>,
        post_id: PostId,
    ) -> Result<PostView, DomainError> {
        let authored = self
            .repos
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", post_id))?;

        let liked = self.liked_posts(viewer, &[post_id]).await?;
        Ok(PostView::new(authored, viewer, liked.contains(&post_id)))
    }

    pub async fn posts_by(
        &self,
        viewer: Option<UserId>,
        handle: &str,
        page: &BackwardPage,
    ) -> Result<Vec<PostView>, DomainError> {
        let author = self
            .repos
            .users
            .find_by_handle(handle)
            .await?
            .ok_or_else(|| DomainError::not_found("user", handle))?;

        let posts = self.repos.posts.by_author(author.id, page).await?;
        let post_ids: Vec<PostId> = posts.iter().map(|post| post.id).collect();
        let liked = self.liked_posts(viewer, &post_ids).await?;
        let summary = author.summary();

        Ok(posts
            .into_iter()
            .map(|post: Post| {
                let is_liked = liked.contains(&post.id);
                PostView::new(
                    Authored {
                        item: post,
                        author: summary.clone(),
                    },
                    viewer,
                    is_liked,
                )
            })
            .collect())
    }

    async fn liked_posts(
        &self,
        viewer: Option<UserId>,
        post_ids: &[PostId],
    ) -> Result<HashSet<PostId>, DomainError> {
        match viewer {
            Some(user_id) if !post_ids.is_empty() => Ok(self
                .repos
                .relationships
                .active_targets(RelationshipKind::PostLike, user_id, post_ids)
                .await?),
            _ => Ok(HashSet::new()),
        }
    }
}
