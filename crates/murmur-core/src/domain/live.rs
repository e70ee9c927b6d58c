use serde::{Deserialize, Serialize};

use super::comment::CommentView;
use super::notification::Notification;
use super::post::PostId;
use super::timeline::TimelineEntry;

/// An item pushed to connected clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum LiveEvent {
    TimelineItem(TimelineEntry),
    Notification(Notification),
    Comment(CommentView),
}

impl LiveEvent {
    /// JSON of the carried record alone, as written to a stream.
    pub fn payload_json(&self) -> Result<String, serde_json::Error> {
        match self {
            LiveEvent::TimelineItem(entry) => serde_json::to_string(entry),
            LiveEvent::Notification(notification) => serde_json::to_string(notification),
            LiveEvent::Comment(comment) => serde_json::to_string(comment),
        }
    }
}

/// Which events a subscriber wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedFilter {
    All,
    Timeline,
    Notifications,
    Comments(PostId),
}

impl FeedFilter {
    pub fn accepts(&self, event: &LiveEvent) -> bool {
        match (self, event) {
            (FeedFilter::All, _) => true,
            (FeedFilter::Timeline, LiveEvent::TimelineItem(_)) => true,
            (FeedFilter::Notifications, LiveEvent::Notification(_)) => true,
            (FeedFilter::Comments(post_id), LiveEvent::Comment(view)) => {
                view.comment.post_id == *post_id
            }
            _ => false,
        }
    }
}
