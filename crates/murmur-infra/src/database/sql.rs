//! Hand-written statements the query builder cannot express.
//!
//! Everything else in the store is built with the SeaORM query builder.

/// Copies a post into the timeline of every follower of its author.
/// `$1` = post id, `$2` = author id.
pub const FAN_OUT_POST: &str = r#"
INSERT INTO timeline (user_id, post_id)
SELECT follower_id, $1 FROM follows WHERE followee_id = $2
ON CONFLICT (user_id, post_id) DO NOTHING
RETURNING id, user_id, post_id, created_at
"#;

/// Opens an unread notification for one user, or moves the actor to the front of the
/// existing one. `$1` = recipient, `$2` = actor handle, `$3` = type, `$4` = post id.
pub const NOTIFY_USER: &str = r#"
INSERT INTO notifications (user_id, actors, type, post_id)
VALUES ($1, ARRAY[$2::text], $3::text, $4::bigint)
ON CONFLICT (user_id, type, COALESCE(post_id, 0)) WHERE read = false
DO UPDATE SET
    actors = array_prepend($2::text, array_remove(notifications.actors, $2::text)),
    issued_at = now()
RETURNING id, user_id, actors, type, post_id, read, issued_at
"#;

/// Same merge for every subscriber of a post except the actor.
/// `$1` = actor handle, `$2` = type, `$3` = post id, `$4` = actor id.
pub const NOTIFY_POST_SUBSCRIBERS: &str = r#"
INSERT INTO notifications (user_id, actors, type, post_id)
SELECT user_id, ARRAY[$1::text], $2::text, $3::bigint
FROM post_subscriptions
WHERE post_id = $3 AND user_id <> $4
ON CONFLICT (user_id, type, COALESCE(post_id, 0)) WHERE read = false
DO UPDATE SET
    actors = array_prepend($1::text, array_remove(notifications.actors, $1::text)),
    issued_at = now()
RETURNING id, user_id, actors, type, post_id, read, issued_at
"#;

/// Same merge for every existing user among the given handles except the actor.
/// `$1` = actor handle, `$2` = type, `$3` = post id, `$4` = actor id, `$5` = handles.
pub const NOTIFY_HANDLES: &str = r#"
INSERT INTO notifications (user_id, actors, type, post_id)
SELECT id, ARRAY[$1::text], $2::text, $3::bigint
FROM users
WHERE handle = ANY($5::text[]) AND id <> $4
ON CONFLICT (user_id, type, COALESCE(post_id, 0)) WHERE read = false
DO UPDATE SET
    actors = array_prepend($1::text, array_remove(notifications.actors, $1::text)),
    issued_at = now()
RETURNING id, user_id, actors, type, post_id, read, issued_at
"#;
