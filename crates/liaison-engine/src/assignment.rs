//! Share assignment lifecycle
//!
//! Actor ↔ share links (owner, titleholder, beneficiary) follow the same
//! Active → Ended → SoftDeleted discipline as relationships. The assignment
//! type is chosen by the caller rather than derived, and exclusivity is a
//! per-call policy instead of an engine rule: several simultaneous
//! beneficiaries are legal unless the caller asks otherwise.

use liaison_domain::lifecycle::transition;
use liaison_domain::traits::{AssignmentQuery, RelationshipStore};
use liaison_domain::{
    ActorId, Assignment, AssignmentId, AssignmentType, Operation, ShareId, Timestamp,
};

use crate::error::storage;
use crate::lifecycle::{check_end_date, live_actor};
use crate::{EngineError, RelationshipEngine};

/// Caller-chosen exclusivity for a new assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExclusivityPolicy {
    /// Other active assignments on the share are left alone
    #[default]
    Shared,

    /// Close other active assignments of the same type on the same share
    ExclusivePerShare,
}

/// Request to assign a share to an actor
#[derive(Debug, Clone, PartialEq)]
pub struct NewAssignment {
    /// Holder
    pub actor: ActorId,

    /// Share being held
    pub share: ShareId,

    /// How the share is held
    pub assignment_type: AssignmentType,

    /// Portion held, 0 to 100
    pub percentage: Option<f64>,

    /// Free-text notes
    pub notes: Option<String>,

    /// Whether to close other holders of the same type
    pub policy: ExclusivityPolicy,
}

impl NewAssignment {
    /// Shared assignment request with no percentage
    pub fn new(actor: ActorId, share: ShareId, assignment_type: AssignmentType) -> Self {
        Self {
            actor,
            share,
            assignment_type,
            percentage: None,
            notes: None,
            policy: ExclusivityPolicy::Shared,
        }
    }

    /// Set the percentage held
    pub fn with_percentage(mut self, percentage: f64) -> Self {
        self.percentage = Some(percentage);
        self
    }

    /// Attach notes
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Close other active holders of this type on the share
    pub fn exclusive(mut self) -> Self {
        self.policy = ExclusivityPolicy::ExclusivePerShare;
        self
    }
}

/// Result of a successful assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignOutcome {
    /// Identifier of the new assignment
    pub id: AssignmentId,

    /// Assignments closed by an exclusive policy
    pub superseded: Vec<AssignmentId>,
}

impl<S: RelationshipStore> RelationshipEngine<S> {
    /// Assign a share to an actor
    ///
    /// The actor must exist and be live. Shares are owned by another
    /// subsystem and are not checked here.
    ///
    /// # Errors
    ///
    /// - `Validation` for a percentage outside 0..=100 or oversized notes
    /// - `NotFound` when the actor is missing or soft-deleted
    pub fn assign_share(&mut self, request: NewAssignment) -> Result<AssignOutcome, EngineError> {
        if let Some(pct) = request.percentage {
            if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
                return Err(EngineError::Validation(format!(
                    "percentage {} is outside 0..=100",
                    pct
                )));
            }
        }
        self.check_notes(request.notes.as_deref())?;
        let now = self.clock.now();

        let outcome = self.atomically("assign share", |repo, _| {
            live_actor(&*repo, request.actor)?;

            let mut superseded = Vec::new();
            if request.policy == ExclusivityPolicy::ExclusivePerShare {
                let query = AssignmentQuery {
                    share: Some(request.share),
                    assignment_type: Some(request.assignment_type),
                    only_open: true,
                    ..Default::default()
                };
                for mut existing in repo.find_assignments(&query).map_err(storage)? {
                    transition(existing.state(), Operation::End)
                        .map_err(|e| EngineError::invalid_state("assignment", existing.id, e))?;
                    existing.end_date = Some(now.max(existing.start_date));
                    existing.updated_at = now;
                    repo.update_assignment(&existing).map_err(storage)?;

                    tracing::debug!(
                        "Closed assignment {} on share {} for exclusive {}",
                        existing.id,
                        request.share,
                        request.assignment_type
                    );
                    superseded.push(existing.id);
                }
            }

            let assignment = Assignment::active(
                request.actor,
                request.share,
                request.assignment_type,
                request.percentage,
                request.notes.clone(),
                now,
            );
            repo.insert_assignment(&assignment).map_err(storage)?;

            Ok(AssignOutcome {
                id: assignment.id,
                superseded,
            })
        })?;

        tracing::info!(
            "Assigned share {} to actor {} as {}, superseded {}",
            request.share,
            request.actor,
            request.assignment_type,
            outcome.superseded.len()
        );
        Ok(outcome)
    }

    /// Close an assignment; `end_date` defaults to now
    ///
    /// # Errors
    ///
    /// - `NotFound` when the assignment does not exist
    /// - `InvalidState` when it is already ended or soft-deleted
    /// - `Validation` for an end date before the start (or a disallowed backdate)
    pub fn end_assignment(
        &mut self,
        id: AssignmentId,
        end_date: Option<Timestamp>,
    ) -> Result<(), EngineError> {
        let now = self.clock.now();

        let end = self.atomically("end assignment", |repo, config| {
            let mut assignment = repo
                .get_assignment(id)
                .map_err(storage)?
                .ok_or_else(|| EngineError::NotFound(format!("assignment {}", id)))?;
            transition(assignment.state(), Operation::End)
                .map_err(|e| EngineError::invalid_state("assignment", id, e))?;

            let end = check_end_date(config, end_date, assignment.start_date, now)?;
            assignment.end_date = Some(end);
            assignment.updated_at = now;
            repo.update_assignment(&assignment).map_err(storage)?;
            Ok(end)
        })?;

        tracing::info!("Ended assignment {} at {}", id, end);
        Ok(())
    }

    /// Soft-delete an assignment
    ///
    /// # Errors
    ///
    /// - `NotFound` when the assignment does not exist
    /// - `InvalidState` when it is already soft-deleted
    pub fn soft_delete_assignment(&mut self, id: AssignmentId) -> Result<(), EngineError> {
        let now = self.clock.now();

        self.atomically("soft-delete assignment", |repo, _| {
            let mut assignment = repo
                .get_assignment(id)
                .map_err(storage)?
                .ok_or_else(|| EngineError::NotFound(format!("assignment {}", id)))?;
            transition(assignment.state(), Operation::SoftDelete)
                .map_err(|e| EngineError::invalid_state("assignment", id, e))?;

            assignment.deleted_at = Some(now);
            assignment.updated_at = now;
            repo.update_assignment(&assignment).map_err(storage)
        })?;

        tracing::info!("Soft-deleted assignment {}", id);
        Ok(())
    }

    /// Audit read: fetch an assignment in any state
    pub fn get_assignment(&self, id: AssignmentId) -> Result<Assignment, EngineError> {
        self.store
            .get_assignment(id)
            .map_err(storage)?
            .ok_or_else(|| EngineError::NotFound(format!("assignment {}", id)))
    }

    /// Non-deleted assignments held by an actor
    pub fn list_assignments_for_actor(
        &self,
        actor: ActorId,
        only_current: bool,
    ) -> Result<Vec<Assignment>, EngineError> {
        self.find_assignments(AssignmentQuery {
            actor: Some(actor),
            only_open: only_current,
            ..Default::default()
        })
    }

    /// Non-deleted assignments on a share
    pub fn list_assignments_for_share(
        &self,
        share: ShareId,
        only_current: bool,
    ) -> Result<Vec<Assignment>, EngineError> {
        self.find_assignments(AssignmentQuery {
            share: Some(share),
            only_open: only_current,
            ..Default::default()
        })
    }

    fn find_assignments(&self, query: AssignmentQuery) -> Result<Vec<Assignment>, EngineError> {
        self.store.find_assignments(&query).map_err(storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FixedClock;
    use liaison_domain::{Actor, Gender, LifecycleState};
    use liaison_store::MemoryStore;
    use std::sync::Arc;

    fn setup() -> (RelationshipEngine<MemoryStore>, ActorId, ActorId, Arc<FixedClock>) {
        let mut store = MemoryStore::new();
        let a = Actor::person("Holder A", Gender::Female);
        let b = Actor::person("Holder B", Gender::Male);
        store.upsert_actor(&a);
        store.upsert_actor(&b);
        let clock = Arc::new(FixedClock::new(100));
        let engine = RelationshipEngine::new(store).with_clock(clock.clone());
        (engine, a.id, b.id, clock)
    }

    #[test]
    fn test_beneficiaries_are_shared_by_default() {
        let (mut engine, a, b, _) = setup();
        let share = ShareId::new();

        engine
            .assign_share(NewAssignment::new(a, share, AssignmentType::Beneficiary).with_percentage(50.0))
            .unwrap();
        engine
            .assign_share(NewAssignment::new(b, share, AssignmentType::Beneficiary).with_percentage(50.0))
            .unwrap();

        assert_eq!(engine.list_assignments_for_share(share, true).unwrap().len(), 2);
    }

    #[test]
    fn test_exclusive_policy_closes_previous_holder() {
        let (mut engine, a, b, clock) = setup();
        let share = ShareId::new();

        let first = engine
            .assign_share(NewAssignment::new(a, share, AssignmentType::Owner))
            .unwrap();
        clock.advance(50);
        let second = engine
            .assign_share(NewAssignment::new(b, share, AssignmentType::Owner).exclusive())
            .unwrap();

        assert_eq!(second.superseded, vec![first.id]);
        let closed = engine.get_assignment(first.id).unwrap();
        assert_eq!(closed.end_date, Some(150));
        assert_eq!(engine.list_assignments_for_share(share, true).unwrap().len(), 1);
        assert_eq!(engine.list_assignments_for_share(share, false).unwrap().len(), 2);
    }

    #[test]
    fn test_percentage_out_of_range() {
        let (mut engine, a, _, _) = setup();
        let err = engine
            .assign_share(
                NewAssignment::new(a, ShareId::new(), AssignmentType::Beneficiary)
                    .with_percentage(120.0),
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(engine.store().write_count(), 0);
    }

    #[test]
    fn test_assign_to_missing_actor() {
        let (mut engine, _, _, _) = setup();
        let err = engine
            .assign_share(NewAssignment::new(ActorId::new(), ShareId::new(), AssignmentType::Owner))
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[test]
    fn test_assignment_lifecycle() {
        let (mut engine, a, _, clock) = setup();
        let outcome = engine
            .assign_share(NewAssignment::new(a, ShareId::new(), AssignmentType::Titleholder))
            .unwrap();

        clock.advance(10);
        engine.end_assignment(outcome.id, None).unwrap();
        assert_eq!(engine.get_assignment(outcome.id).unwrap().state(), LifecycleState::Ended);

        let err = engine.end_assignment(outcome.id, None).unwrap_err();
        assert!(matches!(err, EngineError::InvalidState { record: "assignment", .. }));

        engine.soft_delete_assignment(outcome.id).unwrap();
        assert!(engine.list_assignments_for_actor(a, false).unwrap().is_empty());
        assert_eq!(
            engine.get_assignment(outcome.id).unwrap().state(),
            LifecycleState::SoftDeleted
        );

        let err = engine.soft_delete_assignment(outcome.id).unwrap_err();
        assert!(matches!(err, EngineError::InvalidState { .. }));
    }
}
