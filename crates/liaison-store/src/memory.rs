//! In-memory store
//!
//! A test double with the same observable semantics as [`crate::SqliteStore`]:
//! the active-exclusive uniqueness rule is enforced on every write and
//! [`MemoryStore::atomically`] rolls back by restoring a snapshot. It also
//! counts row writes and can be told to fail after a number of writes, which
//! is how engine tests prove that rejected operations never reach storage and
//! that half-finished units leave no trace.

use std::collections::BTreeMap;

use liaison_domain::traits::{
    AssignmentQuery, RelationshipQuery, RelationshipRepository, RelationshipStore,
};
use liaison_domain::{
    Actor, ActorId, Assignment, AssignmentId, Relationship, RelationshipId, Timestamp,
};

use crate::StoreError;

#[derive(Debug, Clone, Default)]
struct Tables {
    actors: BTreeMap<ActorId, Actor>,
    relationships: BTreeMap<RelationshipId, Relationship>,
    assignments: BTreeMap<AssignmentId, Assignment>,
}

/// Deterministic in-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Tables,
    writes: usize,
    fail_after: Option<usize>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an actor (not counted as a relationship write)
    pub fn upsert_actor(&mut self, actor: &Actor) {
        self.tables.actors.insert(actor.id, actor.clone());
    }

    /// Mark an actor as soft-deleted
    pub fn soft_delete_actor(&mut self, id: ActorId, at: Timestamp) -> Result<(), StoreError> {
        let actor = self
            .tables
            .actors
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("actor {}", id)))?;
        actor.deleted_at = Some(at);
        Ok(())
    }

    /// Number of relationship/assignment row writes attempted so far
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Let `n` more writes succeed, then fail every write after that
    pub fn fail_writes_after(&mut self, n: usize) {
        self.fail_after = Some(self.writes + n);
    }

    /// Stop injecting write failures
    pub fn clear_fault(&mut self) {
        self.fail_after = None;
    }

    fn record_write(&mut self, what: &str) -> Result<(), StoreError> {
        self.writes += 1;
        match self.fail_after {
            Some(limit) if self.writes > limit => {
                Err(StoreError::Unavailable(format!("injected failure on {}", what)))
            }
            _ => Ok(()),
        }
    }

    fn check_relationship(&self, rel: &Relationship) -> Result<(), StoreError> {
        if rel.origin_actor_id == rel.destination_actor_id {
            return Err(StoreError::InvalidData("relationship links an actor to itself".into()));
        }
        for party in [rel.origin_actor_id, rel.destination_actor_id] {
            if !self.tables.actors.contains_key(&party) {
                return Err(StoreError::InvalidData(format!("unknown actor {}", party)));
            }
        }
        if rel.end_date.is_some_and(|end| end < rel.start_date) {
            return Err(StoreError::InvalidData("end_date precedes start_date".into()));
        }

        if rel.exclusive && rel.is_current() {
            let clash = self.tables.relationships.values().any(|other| {
                other.id != rel.id
                    && other.exclusive
                    && other.is_current()
                    && other.origin_actor_id == rel.origin_actor_id
                    && other.relationship_type == rel.relationship_type
                    && other.sub_type.is_some()
                    && other.sub_type == rel.sub_type
            });
            if clash {
                return Err(StoreError::Conflict(format!(
                    "active exclusive relationship already exists for origin {}",
                    rel.origin_actor_id
                )));
            }
        }
        Ok(())
    }

    fn check_assignment(&self, a: &Assignment) -> Result<(), StoreError> {
        if !self.tables.actors.contains_key(&a.actor_id) {
            return Err(StoreError::InvalidData(format!("unknown actor {}", a.actor_id)));
        }
        if a.percentage.is_some_and(|p| !(0.0..=100.0).contains(&p)) {
            return Err(StoreError::InvalidData("percentage out of range".into()));
        }
        if a.end_date.is_some_and(|end| end < a.start_date) {
            return Err(StoreError::InvalidData("end_date precedes start_date".into()));
        }
        Ok(())
    }
}

impl RelationshipRepository for MemoryStore {
    type Error = StoreError;

    fn get_actor(&self, id: ActorId) -> Result<Option<Actor>, Self::Error> {
        Ok(self.tables.actors.get(&id).cloned())
    }

    fn get_actors(&self, ids: &[ActorId]) -> Result<Vec<Actor>, Self::Error> {
        Ok(ids
            .iter()
            .filter_map(|id| self.tables.actors.get(id).cloned())
            .collect())
    }

    fn get_relationship(&self, id: RelationshipId) -> Result<Option<Relationship>, Self::Error> {
        Ok(self.tables.relationships.get(&id).cloned())
    }

    fn find_relationships(
        &self,
        query: &RelationshipQuery,
    ) -> Result<Vec<Relationship>, Self::Error> {
        Ok(self
            .tables
            .relationships
            .values()
            .filter(|rel| query.matches(rel))
            .cloned()
            .collect())
    }

    fn insert_relationship(&mut self, relationship: &Relationship) -> Result<(), Self::Error> {
        self.record_write("insert relationship")?;
        if self.tables.relationships.contains_key(&relationship.id) {
            return Err(StoreError::InvalidData(format!(
                "relationship {} already exists",
                relationship.id
            )));
        }
        self.check_relationship(relationship)?;
        self.tables
            .relationships
            .insert(relationship.id, relationship.clone());
        Ok(())
    }

    fn update_relationship(&mut self, relationship: &Relationship) -> Result<(), Self::Error> {
        self.record_write("update relationship")?;
        if !self.tables.relationships.contains_key(&relationship.id) {
            return Err(StoreError::NotFound(format!("relationship {}", relationship.id)));
        }
        self.check_relationship(relationship)?;
        self.tables
            .relationships
            .insert(relationship.id, relationship.clone());
        Ok(())
    }

    fn get_assignment(&self, id: AssignmentId) -> Result<Option<Assignment>, Self::Error> {
        Ok(self.tables.assignments.get(&id).cloned())
    }

    fn find_assignments(&self, query: &AssignmentQuery) -> Result<Vec<Assignment>, Self::Error> {
        Ok(self
            .tables
            .assignments
            .values()
            .filter(|a| query.matches(a))
            .cloned()
            .collect())
    }

    fn insert_assignment(&mut self, assignment: &Assignment) -> Result<(), Self::Error> {
        self.record_write("insert assignment")?;
        if self.tables.assignments.contains_key(&assignment.id) {
            return Err(StoreError::InvalidData(format!(
                "assignment {} already exists",
                assignment.id
            )));
        }
        self.check_assignment(assignment)?;
        self.tables.assignments.insert(assignment.id, assignment.clone());
        Ok(())
    }

    fn update_assignment(&mut self, assignment: &Assignment) -> Result<(), Self::Error> {
        self.record_write("update assignment")?;
        if !self.tables.assignments.contains_key(&assignment.id) {
            return Err(StoreError::NotFound(format!("assignment {}", assignment.id)));
        }
        self.check_assignment(assignment)?;
        self.tables.assignments.insert(assignment.id, assignment.clone());
        Ok(())
    }
}

impl RelationshipStore for MemoryStore {
    fn atomically<T, E, F>(&mut self, op: F) -> Result<Result<T, E>, Self::Error>
    where
        F: FnOnce(&mut dyn RelationshipRepository<Error = Self::Error>) -> Result<T, E>,
    {
        let snapshot = self.tables.clone();
        let outcome = op(self);
        if outcome.is_err() {
            self.tables = snapshot;
            tracing::debug!("in-memory transaction rolled back");
        }
        Ok(outcome)
    }
}
