use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::{UserId, UserSummary};
use crate::error::DomainError;

pub type PostId = i64;

/// Longest post or comment body, in code points.
pub const MAX_CONTENT_CHARS: usize = 480;
/// Longest spoiler label, in code points.
pub const MAX_SPOILER_CHARS: usize = 64;

/// Post entity - a short message. Immutable except for its counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,
    pub content: String,
    pub spoiler_of: Option<String>,
    pub nsfw: bool,
    pub likes_count: i64,
    pub comments_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Validated input for publishing a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub author_id: UserId,
    pub content: String,
    pub spoiler_of: Option<String>,
    pub nsfw: bool,
}

impl NewPost {
    /// Trims and validates the content and the optional spoiler label.
    pub fn new(
        author_id: UserId,
        content: &str,
        spoiler_of: Option<&str>,
        nsfw: bool,
    ) -> Result<Self, DomainError> {
        let content = normalize_text(content, MAX_CONTENT_CHARS)
            .ok_or_else(|| DomainError::Validation("invalid content".to_string()))?;
        let spoiler_of = match spoiler_of {
            Some(label) => Some(
                normalize_text(label, MAX_SPOILER_CHARS)
                    .ok_or_else(|| DomainError::Validation("invalid spoiler".to_string()))?,
            ),
            None => None,
        };

        Ok(Self {
            author_id,
            content,
            spoiler_of,
            nsfw,
        })
    }
}

/// Trims `text` and checks it is non-empty and at most `max_chars` code points long.
pub fn normalize_text(text: &str, max_chars: usize) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.chars().count() > max_chars {
        return None;
    }
    Some(trimmed.to_string())
}

/// A stored record together with its author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authored<T> {
    pub item: T,
    pub author: UserSummary,
}

/// A post decorated for a viewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub author: UserSummary,
    pub mine: bool,
    pub liked: bool,
}

impl PostView {
    pub fn new(authored: Authored<Post>, viewer: Option<UserId>, liked: bool) -> Self {
        let mine = viewer == Some(authored.item.author_id);
        Self {
            post: authored.item,
            author: authored.author,
            mine,
            liked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_is_trimmed() {
        let post = NewPost::new(1, "  hello world \n", None, false).unwrap();
        assert_eq!(post.content, "hello world");
        assert_eq!(post.spoiler_of, None);
    }

    #[test]
    fn test_content_limit_counts_code_points() {
        let at_limit = "é".repeat(MAX_CONTENT_CHARS);
        assert!(NewPost::new(1, &at_limit, None, false).is_ok());

        let over_limit = "é".repeat(MAX_CONTENT_CHARS + 1);
        let err = NewPost::new(1, &over_limit, None, false).unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg == "invalid content"));
    }

    #[test]
    fn test_blank_content_rejected() {
        assert!(NewPost::new(1, "   \t", None, false).is_err());
    }

    #[test]
    fn test_spoiler_validation() {
        let post = NewPost::new(1, "ending", Some(" Movie "), true).unwrap();
        assert_eq!(post.spoiler_of.as_deref(), Some("Movie"));
        assert!(post.nsfw);

        let err = NewPost::new(1, "ending", Some("  "), false).unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg == "invalid spoiler"));

        let long = "x".repeat(MAX_SPOILER_CHARS + 1);
        assert!(NewPost::new(1, "ending", Some(&long), false).is_err());
    }

    #[test]
    fn test_view_marks_own_posts() {
        let authored = Authored {
            item: Post {
                id: 7,
                author_id: 3,
                content: "hi".to_string(),
                spoiler_of: None,
                nsfw: false,
                likes_count: 0,
                comments_count: 0,
                created_at: Utc::now(),
            },
            author: UserSummary {
                id: 3,
                handle: "carol".to_string(),
                avatar: None,
            },
        };

        assert!(PostView::new(authored.clone(), Some(3), false).mine);
        assert!(!PostView::new(authored.clone(), Some(4), false).mine);
        assert!(!PostView::new(authored, None, false).mine);
    }
}
