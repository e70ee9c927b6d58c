use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

pub type UserId = i64;

/// Longest handle accepted, in characters.
pub const MAX_HANDLE_LEN: usize = 18;

/// User entity - a member of the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub handle: String,
    pub avatar: Option<String>,
    pub followers_count: i64,
    pub followees_count: i64,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            handle: self.handle.clone(),
            avatar: self.avatar.clone(),
        }
    }
}

/// Public author information embedded in posts, comments and timeline items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub handle: String,
    pub avatar: Option<String>,
}

/// A user as seen by a (possibly anonymous) viewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: UserSummary,
    /// Only present when the viewer is looking at their own profile.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub followers_count: i64,
    pub followees_count: i64,
    pub me: bool,
    pub following: bool,
    pub followed_by: bool,
}

impl UserProfile {
    /// Profile with no viewer relationship flags set.
    pub fn anonymous(user: &User) -> Self {
        Self {
            user: user.summary(),
            email: None,
            followers_count: user.followers_count,
            followees_count: user.followees_count,
            me: false,
            following: false,
            followed_by: false,
        }
    }
}

/// Validated input for user creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub handle: String,
}

impl NewUser {
    pub fn new(email: &str, handle: &str) -> Result<Self, DomainError> {
        let email = email.trim().to_lowercase();
        let handle = handle.trim();

        if !is_valid_email(&email) {
            return Err(DomainError::Validation("invalid email".to_string()));
        }
        if !is_valid_handle(handle) {
            return Err(DomainError::Validation("invalid handle".to_string()));
        }

        Ok(Self {
            email,
            handle: handle.to_string(),
        })
    }
}

/// A handle starts with an ASCII letter followed by up to 17 letters, digits, `_` or `-`.
pub fn is_valid_handle(handle: &str) -> bool {
    let mut chars = handle.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    handle.len() <= MAX_HANDLE_LEN && chars.all(is_handle_char)
}

pub(crate) fn is_handle_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Loose shape check: `local@domain.tld` without whitespace.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || local.chars().any(char::is_whitespace) {
        return false;
    }
    if domain.contains('@') || domain.chars().any(char::is_whitespace) {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i < domain.len() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_handles() {
        assert!(is_valid_handle("a"));
        assert!(is_valid_handle("john_doe-99"));
        assert!(is_valid_handle("abcdefghijklmnopqr"));
    }

    #[test]
    fn test_invalid_handles() {
        assert!(!is_valid_handle(""));
        assert!(!is_valid_handle("9lives"));
        assert!(!is_valid_handle("_hidden"));
        assert!(!is_valid_handle("abcdefghijklmnopqrs"));
        assert!(!is_valid_handle("with space"));
        assert!(!is_valid_handle("émile"));
    }

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("john@example.org"));
        assert!(!is_valid_email("john@example"));
        assert!(!is_valid_email("john@.org"));
        assert!(!is_valid_email("@example.org"));
        assert!(!is_valid_email("jo hn@example.org"));
        assert!(!is_valid_email("john@ex@ample.org"));
    }

    #[test]
    fn test_new_user_normalizes_email() {
        let user = NewUser::new("  John@Example.ORG ", " john ").unwrap();
        assert_eq!(user.email, "john@example.org");
        assert_eq!(user.handle, "john");
    }

    #[test]
    fn test_new_user_rejects_bad_handle() {
        let err = NewUser::new("john@example.org", "1john").unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
