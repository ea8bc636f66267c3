//! Lifecycle module - the three-state machine shared by relationships and
//! share assignments
//!
//! ```text
//! Active ──end──▶ Ended
//!   │               │
//!   └──soft_delete──┴──▶ SoftDeleted (terminal)
//! ```
//!
//! Every legal transition is listed in [`transition`]; callers never re-check
//! timestamps themselves.

use std::fmt;

use crate::Timestamp;

/// Lifecycle state of a temporally valid record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// No end date, not deleted
    Active,

    /// End date set, not deleted
    Ended,

    /// Deleted marker set; terminal
    SoftDeleted,
}

impl LifecycleState {
    /// Derive the state from the two nullable timestamps
    pub fn from_timestamps(end_date: Option<Timestamp>, deleted_at: Option<Timestamp>) -> Self {
        match (end_date, deleted_at) {
            (_, Some(_)) => LifecycleState::SoftDeleted,
            (Some(_), None) => LifecycleState::Ended,
            (None, None) => LifecycleState::Active,
        }
    }

    /// Get the state name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Active => "active",
            LifecycleState::Ended => "ended",
            LifecycleState::SoftDeleted => "soft_deleted",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutating lifecycle operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Change the sub-type (and re-derive roles) in place
    Reclassify,

    /// Close temporal validity
    End,

    /// Mark as logically removed
    SoftDelete,
}

impl Operation {
    /// Get the operation name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Reclassify => "reclassify",
            Operation::End => "end",
            Operation::SoftDelete => "soft_delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An operation was attempted from a state that does not allow it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionError {
    /// State the record was in
    pub from: LifecycleState,

    /// Operation that was rejected
    pub operation: Operation,
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot {} a record that is {}", self.operation, self.from)
    }
}

impl std::error::Error for TransitionError {}

/// Apply `operation` to `from`, returning the resulting state
pub fn transition(
    from: LifecycleState,
    operation: Operation,
) -> Result<LifecycleState, TransitionError> {
    use LifecycleState::*;

    match (from, operation) {
        (Active, Operation::Reclassify) => Ok(Active),
        (Active, Operation::End) => Ok(Ended),
        (Active | Ended, Operation::SoftDelete) => Ok(SoftDeleted),
        (Ended | SoftDeleted, _) => Err(TransitionError { from, operation }),
    }
}
