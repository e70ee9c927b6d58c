//! Domain entities - the core business objects.

mod comment;
mod live;
mod mention;
mod notification;
mod pagination;
mod post;
mod relationship;
mod timeline;
mod user;

pub use comment::{Comment, CommentId, CommentView, NewComment};
pub use live::{FeedFilter, LiveEvent};
pub use mention::extract_mentions;
pub use notification::{Audience, Notification, NotificationEvent, NotificationId, NotificationKind};
pub use pagination::{
    normalize_page_size, BackwardPage, ForwardPage, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
    MIN_PAGE_SIZE,
};
pub use post::{normalize_text, Authored, NewPost, Post, PostId, PostView, MAX_CONTENT_CHARS, MAX_SPOILER_CHARS};
pub use relationship::{RelationshipKind, ToggleOutcome, ToggleState};
pub use timeline::{TimelineEntry, TimelineItem, TimelineItemId};
pub use user::{is_valid_email, is_valid_handle, NewUser, User, UserId, UserProfile, UserSummary, MAX_HANDLE_LEN};
