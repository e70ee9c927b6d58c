//! Domain-level error types.

use thiserror::Error;

/// Domain errors - business logic failures.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{entity_type} not found: {key}")]
    NotFound {
        entity_type: &'static str,
        key: String,
    },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity_type: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            key: key.to_string(),
        }
    }
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    /// A row read earlier in the transaction was gone by the time it was written.
    #[error("Row changed concurrently: {0}")]
    StaleRead(String),
}

impl RepoError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, RepoError::UniqueViolation(_))
    }

    /// A concurrent writer got there first; running the operation again may succeed.
    pub fn is_lost_race(&self) -> bool {
        matches!(self, RepoError::UniqueViolation(_) | RepoError::StaleRead(_))
    }

    /// Maps a missing row or a dangling reference to a not-found error for `entity_type`.
    pub fn or_not_found(self, entity_type: &'static str, key: impl ToString) -> DomainError {
        match self {
            RepoError::NotFound | RepoError::ForeignKeyViolation(_) => {
                DomainError::not_found(entity_type, key)
            }
            other => other.into(),
        }
    }
}

impl From<RepoError> for DomainError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => DomainError::not_found("resource", "unknown"),
            RepoError::UniqueViolation(msg) | RepoError::StaleRead(msg) => {
                DomainError::Conflict(msg)
            }
            RepoError::ForeignKeyViolation(msg) => DomainError::not_found("reference", msg),
            RepoError::Connection(msg) => {
                DomainError::Internal(format!("database connection: {msg}"))
            }
            RepoError::Query(msg) => DomainError::Internal(format!("database query: {msg}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foreign_key_violation_maps_to_not_found() {
        let err = RepoError::ForeignKeyViolation("post_likes_post_id_fkey".to_string())
            .or_not_found("post", 42);

        match err {
            DomainError::NotFound { entity_type, key } => {
                assert_eq!(entity_type, "post");
                assert_eq!(key, "42");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_stale_read_is_a_retryable_conflict() {
        let err = RepoError::StaleRead("post_likes (1, 9)".to_string());
        assert!(err.is_lost_race());
        assert!(!err.is_unique_violation());
        assert!(matches!(err.or_not_found("post", 9), DomainError::Conflict(_)));
    }

    #[test]
    fn test_unique_violation_stays_a_conflict() {
        let err = RepoError::UniqueViolation("follows_pkey".to_string()).or_not_found("user", 1);
        assert!(matches!(err, DomainError::Conflict(_)));
    }
}
