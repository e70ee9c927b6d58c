//! SeaORM entities for the graph & content store.

pub mod comment;
pub mod comment_like;
pub mod follow;
pub mod notification;
pub mod post;
pub mod post_like;
pub mod post_subscription;
pub mod timeline;
pub mod user;
