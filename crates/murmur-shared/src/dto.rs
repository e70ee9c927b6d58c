//! Data Transfer Objects - request/response types for the API.
//!
//! Records such as posts, comments and notifications are serialized straight from
//! the domain types; only request bodies, query strings and small envelopes live here.

use serde::{Deserialize, Serialize};

/// Request to register a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub handle: String,
}

/// Request to obtain a token for an existing account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
}

/// Response containing an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user_id: i64,
    pub handle: String,
}

impl AuthResponse {
    pub fn bearer(access_token: String, expires_in: i64, user_id: i64, handle: String) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: expires_in.max(0) as u64,
            user_id,
            handle,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub content: String,
    #[serde(default)]
    pub spoiler_of: Option<String>,
    #[serde(default)]
    pub nsfw: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleFollowResponse {
    pub following: bool,
    pub followers_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleLikeResponse {
    pub liked: bool,
    pub likes_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnreadCountResponse {
    pub unread: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

/// `?last=&before=` for feeds read newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackwardPageQuery {
    pub last: Option<i64>,
    pub before: Option<i64>,
}

/// `?first=&after=` for user listings ordered by handle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForwardPageQuery {
    pub first: Option<i64>,
    pub after: Option<String>,
}

/// `?search=&first=&after=` for the user directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserSearchQuery {
    pub search: Option<String>,
    pub first: Option<i64>,
    pub after: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_post_defaults() {
        let req: CreatePostRequest = serde_json::from_str(r#"{"content":"hi"}"#).unwrap();
        assert_eq!(req.content, "hi");
        assert!(req.spoiler_of.is_none());
        assert!(!req.nsfw);
    }

    #[test]
    fn test_bearer_clamps_negative_expiry() {
        let auth = AuthResponse::bearer("t".to_string(), -5, 1, "ann".to_string());
        assert_eq!(auth.token_type, "Bearer");
        assert_eq!(auth.expires_in, 0);
    }
}
