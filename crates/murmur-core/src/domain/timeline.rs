use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::post::{PostId, PostView};
use super::user::UserId;

pub type TimelineItemId = i64;

/// One materialized row of a user's timeline. Created once, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineItem {
    pub id: TimelineItemId,
    pub user_id: UserId,
    pub post_id: PostId,
    pub created_at: DateTime<Utc>,
}

/// A timeline item as delivered to its owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub id: TimelineItemId,
    pub post: PostView,
}
