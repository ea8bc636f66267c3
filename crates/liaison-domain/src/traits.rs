//! Trait definitions for the storage boundary
//!
//! These traits define the boundary between the engine and the persistence
//! collaborator. Implementations live in `liaison-store`.

use std::fmt;

use crate::{
    Actor, ActorId, Assignment, AssignmentId, AssignmentType, Relationship, RelationshipId,
    RelationshipType, ShareId,
};

/// Classification hook for storage errors
///
/// Stores report whether a failure was a concurrent-write conflict (for
/// example a unique constraint on active exclusive relationships) so the
/// engine can surface it as a conflict instead of a generic store failure.
pub trait StorageFailure: fmt::Display {
    /// True when the failure is a write conflict
    fn is_conflict(&self) -> bool {
        false
    }
}

/// Filtered read criteria for relationships
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationshipQuery {
    /// Match on origin actor
    pub origin: Option<ActorId>,

    /// Match on destination actor
    pub destination: Option<ActorId>,

    /// Match when the actor is origin OR destination
    pub either_party: Option<ActorId>,

    /// Match on category
    pub relationship_type: Option<RelationshipType>,

    /// Match on exact sub-type label
    pub sub_type: Option<String>,

    /// Only rows whose `end_date` is null
    pub only_open: bool,

    /// Include soft-deleted rows (audit reads only)
    pub include_deleted: bool,

    /// Skip one relationship (edit-in-place)
    pub exclude_id: Option<RelationshipId>,
}

impl RelationshipQuery {
    /// All live relationships touching `actor` from either side
    pub fn touching(actor: ActorId) -> Self {
        Self {
            either_party: Some(actor),
            ..Default::default()
        }
    }

    /// Restrict to rows with no end date
    pub fn open_only(mut self) -> Self {
        self.only_open = true;
        self
    }

    /// Reference semantics for the filter; stores must agree with this
    pub fn matches(&self, rel: &Relationship) -> bool {
        if !self.include_deleted && rel.deleted_at.is_some() {
            return false;
        }
        if self.only_open && rel.end_date.is_some() {
            return false;
        }
        if self.origin.is_some_and(|id| rel.origin_actor_id != id) {
            return false;
        }
        if self.destination.is_some_and(|id| rel.destination_actor_id != id) {
            return false;
        }
        if self.either_party.is_some_and(|id| !rel.involves(id)) {
            return false;
        }
        if self.relationship_type.is_some_and(|t| rel.relationship_type != t) {
            return false;
        }
        if let Some(sub_type) = &self.sub_type {
            if rel.sub_type.as_deref() != Some(sub_type.as_str()) {
                return false;
            }
        }
        if self.exclude_id == Some(rel.id) {
            return false;
        }
        true
    }
}

/// Filtered read criteria for share assignments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignmentQuery {
    /// Match on holder
    pub actor: Option<ActorId>,

    /// Match on share
    pub share: Option<ShareId>,

    /// Match on assignment type
    pub assignment_type: Option<AssignmentType>,

    /// Only rows whose `end_date` is null
    pub only_open: bool,

    /// Include soft-deleted rows
    pub include_deleted: bool,

    /// Skip one assignment
    pub exclude_id: Option<AssignmentId>,
}

impl AssignmentQuery {
    /// Reference semantics for the filter; stores must agree with this
    pub fn matches(&self, a: &Assignment) -> bool {
        if !self.include_deleted && a.deleted_at.is_some() {
            return false;
        }
        if self.only_open && a.end_date.is_some() {
            return false;
        }
        if self.actor.is_some_and(|id| a.actor_id != id) {
            return false;
        }
        if self.share.is_some_and(|id| a.share_id != id) {
            return false;
        }
        if self.assignment_type.is_some_and(|t| a.assignment_type != t) {
            return false;
        }
        self.exclude_id != Some(a.id)
    }
}

/// Row-level reads and writes against the shared store
///
/// Object-safe so the engine can run the same logic inside and outside a
/// transaction scope.
pub trait RelationshipRepository {
    /// Error type for store operations
    type Error: StorageFailure;

    /// Look up an actor (soft-deleted actors are returned with their marker set)
    fn get_actor(&self, id: ActorId) -> Result<Option<Actor>, Self::Error>;

    /// Batch actor lookup; missing ids are silently skipped
    fn get_actors(&self, ids: &[ActorId]) -> Result<Vec<Actor>, Self::Error>;

    /// Get a relationship by ID regardless of state
    fn get_relationship(&self, id: RelationshipId) -> Result<Option<Relationship>, Self::Error>;

    /// Query relationships matching criteria
    fn find_relationships(
        &self,
        query: &RelationshipQuery,
    ) -> Result<Vec<Relationship>, Self::Error>;

    /// Insert a new relationship row
    fn insert_relationship(&mut self, relationship: &Relationship) -> Result<(), Self::Error>;

    /// Overwrite an existing relationship row (matched by id)
    fn update_relationship(&mut self, relationship: &Relationship) -> Result<(), Self::Error>;

    /// Get an assignment by ID regardless of state
    fn get_assignment(&self, id: AssignmentId) -> Result<Option<Assignment>, Self::Error>;

    /// Query assignments matching criteria
    fn find_assignments(&self, query: &AssignmentQuery) -> Result<Vec<Assignment>, Self::Error>;

    /// Insert a new assignment row
    fn insert_assignment(&mut self, assignment: &Assignment) -> Result<(), Self::Error>;

    /// Overwrite an existing assignment row (matched by id)
    fn update_assignment(&mut self, assignment: &Assignment) -> Result<(), Self::Error>;
}

/// A repository that can scope several writes into one atomic unit
pub trait RelationshipStore: RelationshipRepository {
    /// Run `op` inside a transaction
    ///
    /// The outer `Result` reports failures to begin or commit. The inner
    /// `Result` is whatever `op` returned; when it is `Err` every write made
    /// through the scoped repository is rolled back before returning.
    fn atomically<T, E, F>(&mut self, op: F) -> Result<Result<T, E>, Self::Error>
    where
        F: FnOnce(&mut dyn RelationshipRepository<Error = Self::Error>) -> Result<T, E>;
}
