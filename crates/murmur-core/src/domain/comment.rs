use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::post::{normalize_text, Authored, PostId, MAX_CONTENT_CHARS};
use super::user::{UserId, UserSummary};
use crate::error::DomainError;

pub type CommentId = i64;

/// Comment entity - a reply attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub author_id: UserId,
    pub content: String,
    pub likes_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Validated input for commenting on a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub post_id: PostId,
    pub author_id: UserId,
    pub content: String,
}

impl NewComment {
    pub fn new(author_id: UserId, post_id: PostId, content: &str) -> Result<Self, DomainError> {
        let content = normalize_text(content, MAX_CONTENT_CHARS)
            .ok_or_else(|| DomainError::Validation("invalid content".to_string()))?;
        Ok(Self {
            post_id,
            author_id,
            content,
        })
    }
}

/// A comment decorated for a viewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: UserSummary,
    pub mine: bool,
    pub liked: bool,
}

impl CommentView {
    pub fn new(authored: Authored<Comment>, viewer: Option<UserId>, liked: bool) -> Self {
        let mine = viewer == Some(authored.item.author_id);
        Self {
            comment: authored.item,
            author: authored.author,
            mine,
            liked,
        }
    }
}
