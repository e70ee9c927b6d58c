use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::post::PostId;
use super::user::UserId;

pub type NotificationId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Follow,
    Comment,
    Mention,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Follow => "follow",
            NotificationKind::Comment => "comment",
            NotificationKind::Mention => "mention",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "follow" => Ok(NotificationKind::Follow),
            "comment" => Ok(NotificationKind::Comment),
            "mention" => Ok(NotificationKind::Mention),
            other => Err(format!("unknown notification type: {other}")),
        }
    }
}

/// A per-user notification. While unread, repeated activity on the same
/// (recipient, kind, subject) key is merged into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    /// Actor handles, most recent first, without duplicates.
    pub actors: Vec<String>,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub post_id: Option<PostId>,
    pub read: bool,
    pub issued_at: DateTime<Utc>,
}

impl Notification {
    /// Fresh unread notification carrying a single actor.
    pub fn open(
        id: NotificationId,
        user_id: UserId,
        event: &NotificationEvent,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            actors: vec![event.actor.clone()],
            kind: event.kind,
            post_id: event.post_id,
            read: false,
            issued_at: now,
        }
    }

    /// Whether an event for `kind` and `post_id` folds into this notification.
    pub fn accepts(&self, kind: NotificationKind, post_id: Option<PostId>) -> bool {
        !self.read && self.kind == kind && self.post_id == post_id
    }

    /// Moves `actor` to the front of the actor list and bumps the issue time.
    pub fn merge_actor(&mut self, actor: &str, now: DateTime<Utc>) {
        self.actors.retain(|existing| existing != actor);
        self.actors.insert(0, actor.to_string());
        self.issued_at = now;
    }
}

/// Something a user did that others should hear about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    pub kind: NotificationKind,
    pub actor_id: UserId,
    pub actor: String,
    pub post_id: Option<PostId>,
}

/// Who receives a notification event. The actor is always excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    User(UserId),
    PostSubscribers(PostId),
    Handles(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn follow_from(actor: &str) -> NotificationEvent {
        NotificationEvent {
            kind: NotificationKind::Follow,
            actor_id: 1,
            actor: actor.to_string(),
            post_id: None,
        }
    }

    #[test]
    fn test_merge_moves_actor_to_front() {
        let start = Utc::now();
        let mut n = Notification::open(1, 2, &follow_from("ann"), start);
        n.merge_actor("bob", start);
        n.merge_actor("cid", start);
        assert_eq!(n.actors, vec!["cid", "bob", "ann"]);

        let later = start + Duration::seconds(5);
        n.merge_actor("ann", later);
        assert_eq!(n.actors, vec!["ann", "cid", "bob"]);
        assert_eq!(n.issued_at, later);
    }

    #[test]
    fn test_merge_same_actor_keeps_single_entry() {
        let now = Utc::now();
        let mut n = Notification::open(1, 2, &follow_from("ann"), now);
        n.merge_actor("ann", now);
        n.merge_actor("ann", now);
        assert_eq!(n.actors, vec!["ann"]);
    }

    #[test]
    fn test_read_notification_accepts_nothing() {
        let mut n = Notification::open(1, 2, &follow_from("ann"), Utc::now());
        assert!(n.accepts(NotificationKind::Follow, None));
        assert!(!n.accepts(NotificationKind::Comment, None));
        assert!(!n.accepts(NotificationKind::Follow, Some(4)));
        n.read = true;
        assert!(!n.accepts(NotificationKind::Follow, None));
    }

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in [
            NotificationKind::Follow,
            NotificationKind::Comment,
            NotificationKind::Mention,
        ] {
            assert_eq!(kind.as_str().parse::<NotificationKind>().unwrap(), kind);
        }
        assert!("like".parse::<NotificationKind>().is_err());
    }

    #[test]
    fn test_serializes_kind_as_type() {
        let n = Notification::open(1, 2, &follow_from("ann"), Utc::now());
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "follow");
        assert_eq!(json["actors"][0], "ann");
    }
}
