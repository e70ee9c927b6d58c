use serde::{Deserialize, Serialize};

/// The toggleable relationships of the social graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    /// user -> user; counters: followee's followers, follower's followees.
    Follow,
    /// user -> post; counter: post likes.
    PostLike,
    /// user -> comment; counter: comment likes.
    CommentLike,
}

impl RelationshipKind {
    /// Name of the entity on the receiving end of the edge.
    pub fn target_entity(&self) -> &'static str {
        match self {
            RelationshipKind::Follow => "user",
            RelationshipKind::PostLike => "post",
            RelationshipKind::CommentLike => "comment",
        }
    }
}

/// What the store observed while flipping an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleState {
    /// Whether the edge existed before the flip.
    pub was_active: bool,
    /// The target counter read back after the flip.
    pub count: i64,
}

/// Result of a toggle as reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleOutcome {
    pub active: bool,
    pub count: i64,
}

impl From<ToggleState> for ToggleOutcome {
    fn from(state: ToggleState) -> Self {
        Self {
            active: !state.was_active,
            count: state.count,
        }
    }
}
