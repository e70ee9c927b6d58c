use sea_orm::{DbErr, SqlErr};

use murmur_core::error::RepoError;

/// Classifies a SeaORM error so constraint violations stay distinguishable.
pub(crate) fn db_err(err: DbErr) -> RepoError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => return RepoError::UniqueViolation(msg),
        Some(SqlErr::ForeignKeyConstraintViolation(msg)) => {
            return RepoError::ForeignKeyViolation(msg);
        }
        _ => {}
    }

    match err {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => RepoError::Connection(err.to_string()),
        DbErr::RecordNotFound(_) => RepoError::NotFound,
        other => RepoError::Query(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_constraint_errors_are_query_errors() {
        let err = db_err(DbErr::Custom("boom".to_string()));
        assert!(matches!(err, RepoError::Query(msg) if msg.contains("boom")));
    }

    #[test]
    fn test_record_not_found_maps_to_not_found() {
        let err = db_err(DbErr::RecordNotFound("users".to_string()));
        assert!(matches!(err, RepoError::NotFound));
    }
}
