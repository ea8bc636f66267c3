//! Storage error types

use liaison_domain::traits::StorageFailure;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Row targeted by an update does not exist
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Attribute bag (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A write would violate a uniqueness constraint
    #[error("Write conflict: {0}")]
    Conflict(String),

    /// The store refused the operation (used by the in-memory fault injector)
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Classify a failed write.
    ///
    /// Only unique-index violations are conflicts; CHECK, NOT NULL and
    /// foreign key failures mean the row itself was bad.
    pub(crate) fn from_write(err: rusqlite::Error, what: &str) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(failure, msg)
                if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                let detail = format!(
                    "{}: {}",
                    what,
                    msg.as_deref().unwrap_or("constraint violation")
                );
                if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE {
                    StoreError::Conflict(detail)
                } else {
                    StoreError::InvalidData(detail)
                }
            }
            _ => StoreError::Database(err),
        }
    }
}

impl StorageFailure for StoreError {
    fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_classification() {
        assert!(StoreError::Conflict("dup".into()).is_conflict());
        assert!(!StoreError::NotFound("x".into()).is_conflict());
        assert!(!StoreError::Unavailable("down".into()).is_conflict());
    }

    #[test]
    fn test_constraint_violation_becomes_conflict() {
        let raw = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE),
            Some("UNIQUE constraint failed".to_string()),
        );
        let err = StoreError::from_write(raw, "insert relationship");
        assert!(err.is_conflict());
        assert!(err.to_string().contains("UNIQUE constraint failed"));
    }

    #[test]
    fn test_check_and_foreign_key_failures_are_not_conflicts() {
        for code in [
            rusqlite::ffi::SQLITE_CONSTRAINT_CHECK,
            rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
            rusqlite::ffi::SQLITE_CONSTRAINT_NOTNULL,
        ] {
            let raw = rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(code),
                Some("constraint failed".to_string()),
            );
            let err = StoreError::from_write(raw, "update relationship");
            assert!(!err.is_conflict());
            assert!(matches!(err, StoreError::InvalidData(_)));
        }
    }
}
