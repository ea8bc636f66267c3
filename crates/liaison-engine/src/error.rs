//! Error types for engine operations

use liaison_domain::traits::StorageFailure;
use liaison_domain::{LifecycleState, Operation, TransitionError};
use thiserror::Error;

/// Errors surfaced to callers of the engine
///
/// The first four variants are the caller-facing taxonomy; none of them is
/// retried by the engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Malformed input (self-link, missing field, unknown category)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced actor or relationship does not exist or is soft-deleted
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation not allowed in the record's current lifecycle state
    #[error("Invalid state: cannot {operation} {record} {id} while it is {state}")]
    InvalidState {
        /// Kind of record ("relationship", "assignment")
        record: &'static str,
        /// Record identifier
        id: String,
        /// State the record was in
        state: LifecycleState,
        /// Rejected operation
        operation: Operation,
    },

    /// A concurrent write would violate exclusivity
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Opaque storage failure
    #[error("Storage error: {0}")]
    Store(String),
}

impl EngineError {
    /// Build an `InvalidState` error from a rejected transition
    pub(crate) fn invalid_state(
        record: &'static str,
        id: impl ToString,
        err: TransitionError,
    ) -> Self {
        EngineError::InvalidState {
            record,
            id: id.to_string(),
            state: err.from,
            operation: err.operation,
        }
    }

    /// Whether a caller's transport layer may reasonably retry
    ///
    /// Only opaque storage failures qualify; everything else is a bad
    /// request that will fail the same way again.
    pub fn is_retriable(&self) -> bool {
        matches!(self, EngineError::Store(_))
    }
}

/// Map a store error, keeping conflicts distinguishable
pub(crate) fn storage<E: StorageFailure>(err: E) -> EngineError {
    if err.is_conflict() {
        EngineError::Conflict(err.to_string())
    } else {
        EngineError::Store(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct FakeFailure(bool);

    impl fmt::Display for FakeFailure {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "fake failure")
        }
    }

    impl StorageFailure for FakeFailure {
        fn is_conflict(&self) -> bool {
            self.0
        }
    }

    #[test]
    fn test_storage_mapping() {
        assert!(matches!(storage(FakeFailure(true)), EngineError::Conflict(_)));
        assert!(matches!(storage(FakeFailure(false)), EngineError::Store(_)));
    }

    #[test]
    fn test_taxonomy_is_not_retriable() {
        assert!(!EngineError::Validation("x".into()).is_retriable());
        assert!(!EngineError::NotFound("x".into()).is_retriable());
        assert!(!EngineError::Conflict("x".into()).is_retriable());
        assert!(EngineError::Store("io".into()).is_retriable());
    }

    #[test]
    fn test_invalid_state_message() {
        let err = EngineError::invalid_state(
            "relationship",
            "abc",
            TransitionError {
                from: LifecycleState::SoftDeleted,
                operation: Operation::End,
            },
        );
        assert_eq!(
            err.to_string(),
            "Invalid state: cannot end relationship abc while it is soft_deleted"
        );
    }
}
