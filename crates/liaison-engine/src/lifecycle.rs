//! Relationship lifecycle management
//!
//! Orchestrates create, reclassify, end and soft-delete. Every mutating
//! operation runs as one atomic unit on the store, so the exclusivity
//! close-out and the write it protects either both land or neither does.

use std::sync::Arc;

use liaison_domain::lifecycle::transition;
use liaison_domain::relationship::{
    ATTR_PREVIOUS_SUB_TYPE, ATTR_RECLASSIFIED_AT, ATTR_REQUESTED_SUB_TYPE,
};
use liaison_domain::roles::resolve_for;
use liaison_domain::traits::{RelationshipRepository, RelationshipStore, StorageFailure};
use liaison_domain::{
    Actor, ActorId, FamilySubType, Operation, Relationship, RelationshipId, RelationshipType,
    Timestamp,
};

use crate::error::storage;
use crate::exclusivity::enforce_exclusivity;
use crate::{Clock, EngineConfig, EngineError, SystemClock};

/// Request to link two actors
#[derive(Debug, Clone, PartialEq)]
pub struct NewRelationship {
    /// First party; its gender drives role derivation
    pub origin: ActorId,

    /// Second party
    pub destination: ActorId,

    /// Category
    pub relationship_type: RelationshipType,

    /// What the destination is to the origin (required for family)
    pub sub_type: Option<String>,

    /// Free-text notes
    pub notes: Option<String>,

    /// False when the link only reads one way
    pub is_bidirectional: bool,
}

impl NewRelationship {
    /// Link request with no sub-type
    pub fn new(origin: ActorId, destination: ActorId, relationship_type: RelationshipType) -> Self {
        Self {
            origin,
            destination,
            relationship_type,
            sub_type: None,
            notes: None,
            is_bidirectional: true,
        }
    }

    /// Family link request; `sub_type` is what `destination` is to `origin`
    pub fn family(origin: ActorId, destination: ActorId, sub_type: impl Into<String>) -> Self {
        Self::new(origin, destination, RelationshipType::Family).with_sub_type(sub_type)
    }

    /// Set the sub-type label
    pub fn with_sub_type(mut self, sub_type: impl Into<String>) -> Self {
        self.sub_type = Some(sub_type.into());
        self
    }

    /// Attach notes
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Mark the link as one-way
    pub fn one_way(mut self) -> Self {
        self.is_bidirectional = false;
        self
    }
}

/// Result of a successful create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkOutcome {
    /// Identifier of the new relationship
    pub id: RelationshipId,

    /// Relationships closed to keep the origin's exclusive sub-type unique
    pub superseded: Vec<RelationshipId>,
}

/// Parse a caller-supplied category name
pub fn parse_category(s: &str) -> Result<RelationshipType, EngineError> {
    RelationshipType::parse(s)
        .ok_or_else(|| EngineError::Validation(format!("unrecognized relationship category '{}'", s)))
}

/// Canonical sub-type for storage plus the raw label when it was not recognized
struct NormalizedSubType {
    label: Option<String>,
    requested: Option<String>,
}

fn normalize_sub_type(
    relationship_type: RelationshipType,
    sub_type: Option<&str>,
) -> Result<NormalizedSubType, EngineError> {
    let raw = sub_type.map(str::trim).filter(|s| !s.is_empty());

    match (relationship_type, raw) {
        (RelationshipType::Family, None) => Err(EngineError::Validation(
            "family relationships require a sub-type".to_string(),
        )),
        (RelationshipType::Family, Some(raw)) => Ok(match FamilySubType::parse(raw) {
            Some(known) => NormalizedSubType {
                label: Some(known.as_str().to_string()),
                requested: None,
            },
            None => NormalizedSubType {
                label: Some(FamilySubType::Other.as_str().to_string()),
                requested: Some(raw.to_string()),
            },
        }),
        (_, raw) => Ok(NormalizedSubType {
            label: raw.map(str::to_string),
            requested: None,
        }),
    }
}

/// Load an actor that must exist and not be soft-deleted
pub(crate) fn live_actor<E: StorageFailure>(
    repo: &dyn RelationshipRepository<Error = E>,
    id: ActorId,
) -> Result<Actor, EngineError> {
    match repo.get_actor(id).map_err(storage)? {
        Some(actor) if !actor.is_deleted() => Ok(actor),
        Some(_) => Err(EngineError::NotFound(format!("actor {} is deleted", id))),
        None => Err(EngineError::NotFound(format!("actor {}", id))),
    }
}

/// The relationship engine
///
/// Owns a store and applies the lifecycle rules on top of it. Reads live in
/// [`crate::query`], share assignments in [`crate::assignment`].
///
/// # Examples
///
/// ```
/// use liaison_domain::{Actor, Gender};
/// use liaison_engine::{NewRelationship, RelationshipEngine};
/// use liaison_store::MemoryStore;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut store = MemoryStore::new();
/// let ana = Actor::person("Ana", Gender::Female);
/// let luis = Actor::person("Luis", Gender::Male);
/// store.upsert_actor(&ana);
/// store.upsert_actor(&luis);
///
/// let mut engine = RelationshipEngine::new(store);
/// let outcome = engine.create_relationship(NewRelationship::family(ana.id, luis.id, "spouse"))?;
/// assert!(outcome.superseded.is_empty());
///
/// engine.end_relationship(outcome.id, None)?;
/// # Ok(())
/// # }
/// ```
pub struct RelationshipEngine<S> {
    pub(crate) store: S,
    pub(crate) config: EngineConfig,
    pub(crate) clock: Arc<dyn Clock>,
}

impl<S: RelationshipStore> RelationshipEngine<S> {
    /// Create an engine with the default configuration and the system clock
    pub fn new(store: S) -> Self {
        Self {
            store,
            config: EngineConfig::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Create an engine with the given configuration
    ///
    /// Fails with [`EngineError::Config`] when the configuration does not
    /// pass [`EngineConfig::validate`].
    pub fn with_config(store: S, config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new(store)
        })
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Borrow the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutably borrow the underlying store
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Consume the engine and return the store
    pub fn into_store(self) -> S {
        self.store
    }

    /// Run `op` as one atomic unit, rolling back on any error
    pub(crate) fn atomically<T, F>(&mut self, what: &str, op: F) -> Result<T, EngineError>
    where
        F: FnOnce(
            &mut dyn RelationshipRepository<Error = S::Error>,
            &EngineConfig,
        ) -> Result<T, EngineError>,
    {
        let config = &self.config;
        let outcome = self
            .store
            .atomically(|repo| op(repo, config))
            .map_err(storage)?;

        if let Err(err) = &outcome {
            tracing::warn!("{} rolled back: {}", what, err);
        }
        outcome
    }

    pub(crate) fn check_notes(&self, notes: Option<&str>) -> Result<(), EngineError> {
        match notes {
            Some(text) if text.chars().count() > self.config.max_notes_len => {
                Err(EngineError::Validation(format!(
                    "notes exceed {} characters",
                    self.config.max_notes_len
                )))
            }
            _ => Ok(()),
        }
    }

    /// Link two actors
    ///
    /// Self-links are rejected before any storage access. Roles are derived
    /// from the sub-type and the origin's gender. When the sub-type is
    /// exclusive, the origin's other active links of that sub-type are closed
    /// in the same atomic unit as the insert.
    ///
    /// # Errors
    ///
    /// - `Validation` for a self-link, a family link without sub-type, or
    ///   notes over the configured limit
    /// - `NotFound` when either actor is missing or soft-deleted
    /// - `Conflict` when a concurrent writer won the exclusive slot
    pub fn create_relationship(
        &mut self,
        request: NewRelationship,
    ) -> Result<LinkOutcome, EngineError> {
        if request.origin == request.destination {
            return Err(EngineError::Validation(format!(
                "actor {} cannot be linked to itself",
                request.origin
            )));
        }
        self.check_notes(request.notes.as_deref())?;
        let sub_type = normalize_sub_type(request.relationship_type, request.sub_type.as_deref())?;
        let now = self.clock.now();

        let outcome = self.atomically("create relationship", |repo, config| {
            let origin = live_actor(&*repo, request.origin)?;
            live_actor(&*repo, request.destination)?;

            let label = sub_type.label.as_deref();
            let roles = resolve_for(request.relationship_type, label, origin.gender);
            let superseded = enforce_exclusivity(
                repo,
                config,
                request.origin,
                request.relationship_type,
                label,
                None,
                now,
            )?;

            let mut rel = Relationship::active(
                request.origin,
                request.destination,
                request.relationship_type,
                sub_type.label.clone(),
                roles,
                config.is_exclusive(request.relationship_type, label),
                request.notes.clone(),
                now,
            );
            rel.is_bidirectional = request.is_bidirectional;
            if let Some(raw) = &sub_type.requested {
                rel.attributes
                    .insert(ATTR_REQUESTED_SUB_TYPE.to_string(), raw.clone());
            }
            repo.insert_relationship(&rel).map_err(storage)?;

            Ok(LinkOutcome {
                id: rel.id,
                superseded,
            })
        })?;

        tracing::info!(
            "Created relationship {} ({} -> {}, {} {:?}), superseded {}",
            outcome.id,
            request.origin,
            request.destination,
            request.relationship_type,
            sub_type.label,
            outcome.superseded.len()
        );
        Ok(outcome)
    }

    /// Change a relationship's sub-type in place
    ///
    /// Roles are re-derived from the origin's current gender, not the one
    /// recorded at creation. Identifiers and `start_date` are preserved.
    /// Returns the relationships closed by exclusivity.
    ///
    /// # Errors
    ///
    /// - `NotFound` when the relationship or its origin actor is missing
    /// - `InvalidState` unless the relationship is active
    /// - `Validation` for an empty family sub-type
    pub fn reclassify_relationship(
        &mut self,
        id: RelationshipId,
        new_sub_type: &str,
    ) -> Result<Vec<RelationshipId>, EngineError> {
        let now = self.clock.now();

        let superseded = self.atomically("reclassify relationship", |repo, config| {
            let mut rel = repo
                .get_relationship(id)
                .map_err(storage)?
                .ok_or_else(|| EngineError::NotFound(format!("relationship {}", id)))?;
            transition(rel.state(), Operation::Reclassify)
                .map_err(|e| EngineError::invalid_state("relationship", id, e))?;

            let sub_type = normalize_sub_type(rel.relationship_type, Some(new_sub_type))?;
            let label = sub_type.label.as_deref();
            let origin = live_actor(&*repo, rel.origin_actor_id)?;
            let roles = resolve_for(rel.relationship_type, label, origin.gender);

            let superseded = enforce_exclusivity(
                repo,
                config,
                rel.origin_actor_id,
                rel.relationship_type,
                label,
                Some(id),
                now,
            )?;

            if let Some(previous) = rel.sub_type.take() {
                rel.attributes
                    .insert(ATTR_PREVIOUS_SUB_TYPE.to_string(), previous);
            }
            rel.attributes
                .insert(ATTR_RECLASSIFIED_AT.to_string(), now.to_string());
            match &sub_type.requested {
                Some(raw) => {
                    rel.attributes
                        .insert(ATTR_REQUESTED_SUB_TYPE.to_string(), raw.clone());
                }
                None => {
                    rel.attributes.remove(ATTR_REQUESTED_SUB_TYPE);
                }
            }

            rel.exclusive = config.is_exclusive(rel.relationship_type, label);
            rel.sub_type = sub_type.label;
            rel.origin_role = roles.origin;
            rel.destination_role = roles.destination;
            rel.updated_at = now;
            repo.update_relationship(&rel).map_err(storage)?;

            Ok(superseded)
        })?;

        tracing::info!(
            "Reclassified relationship {} to '{}', superseded {}",
            id,
            new_sub_type,
            superseded.len()
        );
        Ok(superseded)
    }

    /// Close a relationship's temporal validity
    ///
    /// `end_date` defaults to now. It may never precede the start date, and
    /// may only precede now when backdating is allowed by configuration.
    ///
    /// # Errors
    ///
    /// - `NotFound` when the relationship does not exist
    /// - `InvalidState` when it is already ended or soft-deleted
    /// - `Validation` for an end date before the start (or a disallowed backdate)
    pub fn end_relationship(
        &mut self,
        id: RelationshipId,
        end_date: Option<Timestamp>,
    ) -> Result<(), EngineError> {
        let now = self.clock.now();

        let end = self.atomically("end relationship", |repo, config| {
            let mut rel = repo
                .get_relationship(id)
                .map_err(storage)?
                .ok_or_else(|| EngineError::NotFound(format!("relationship {}", id)))?;
            transition(rel.state(), Operation::End)
                .map_err(|e| EngineError::invalid_state("relationship", id, e))?;

            let end = check_end_date(config, end_date, rel.start_date, now)?;
            rel.end_date = Some(end);
            rel.updated_at = now;
            repo.update_relationship(&rel).map_err(storage)?;
            Ok(end)
        })?;

        tracing::info!("Ended relationship {} at {}", id, end);
        Ok(())
    }

    /// Soft-delete a relationship; it stays readable through [`Self::get_relationship`]
    ///
    /// # Errors
    ///
    /// - `NotFound` when the relationship does not exist
    /// - `InvalidState` when it is already soft-deleted
    pub fn soft_delete_relationship(&mut self, id: RelationshipId) -> Result<(), EngineError> {
        let now = self.clock.now();

        self.atomically("soft-delete relationship", |repo, _| {
            let mut rel = repo
                .get_relationship(id)
                .map_err(storage)?
                .ok_or_else(|| EngineError::NotFound(format!("relationship {}", id)))?;
            transition(rel.state(), Operation::SoftDelete)
                .map_err(|e| EngineError::invalid_state("relationship", id, e))?;

            rel.deleted_at = Some(now);
            rel.updated_at = now;
            repo.update_relationship(&rel).map_err(storage)
        })?;

        tracing::info!("Soft-deleted relationship {}", id);
        Ok(())
    }

    /// Audit read: fetch a relationship in any state, soft-deleted included
    pub fn get_relationship(&self, id: RelationshipId) -> Result<Relationship, EngineError> {
        self.store
            .get_relationship(id)
            .map_err(storage)?
            .ok_or_else(|| EngineError::NotFound(format!("relationship {}", id)))
    }
}

/// Resolve and validate an explicit or defaulted end date
// Stores keep timestamps as signed 64-bit integers.
const MAX_TIMESTAMP: Timestamp = i64::MAX as Timestamp;

pub(crate) fn check_end_date(
    config: &EngineConfig,
    requested: Option<Timestamp>,
    start_date: Timestamp,
    now: Timestamp,
) -> Result<Timestamp, EngineError> {
    let end = requested.unwrap_or(now);
    if end > MAX_TIMESTAMP {
        return Err(EngineError::Validation(format!(
            "end date {} is beyond the storable range",
            end
        )));
    }
    if end < start_date {
        return Err(EngineError::Validation(format!(
            "end date {} precedes start date {}",
            end, start_date
        )));
    }
    if end < now && !config.allow_backdated_end {
        return Err(EngineError::Validation(format!(
            "end date {} is in the past and backdating is disabled",
            end
        )));
    }
    Ok(end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FixedClock;
    use liaison_domain::{Gender, LifecycleState, Role};
    use liaison_store::MemoryStore;

    fn engine_with(genders: &[Gender]) -> (RelationshipEngine<MemoryStore>, Vec<ActorId>) {
        let mut store = MemoryStore::new();
        let ids = genders
            .iter()
            .enumerate()
            .map(|(i, g)| {
                let actor = Actor::person(format!("actor-{}", i), *g);
                store.upsert_actor(&actor);
                actor.id
            })
            .collect();
        let engine = RelationshipEngine::new(store).with_clock(Arc::new(FixedClock::new(1_000)));
        (engine, ids)
    }

    #[test]
    fn test_parse_category() {
        assert_eq!(parse_category("family").unwrap(), RelationshipType::Family);
        assert!(matches!(parse_category("enemy"), Err(EngineError::Validation(_))));
    }

    #[test]
    fn test_normalize_sub_type() {
        let known = normalize_sub_type(RelationshipType::Family, Some(" Spouse ")).unwrap();
        assert_eq!(known.label.as_deref(), Some("spouse"));
        assert!(known.requested.is_none());

        let unknown = normalize_sub_type(RelationshipType::Family, Some("cousin")).unwrap();
        assert_eq!(unknown.label.as_deref(), Some("other"));
        assert_eq!(unknown.requested.as_deref(), Some("cousin"));

        assert!(normalize_sub_type(RelationshipType::Family, Some("  ")).is_err());
        assert!(normalize_sub_type(RelationshipType::Family, None).is_err());

        let free = normalize_sub_type(RelationshipType::Commercial, Some("supplier")).unwrap();
        assert_eq!(free.label.as_deref(), Some("supplier"));
        assert!(normalize_sub_type(RelationshipType::Commercial, None).unwrap().label.is_none());
    }

    #[test]
    fn test_create_unknown_sub_type_keeps_raw_label() {
        let (mut engine, ids) = engine_with(&[Gender::Male, Gender::Male]);
        let outcome = engine
            .create_relationship(NewRelationship::family(ids[0], ids[1], "cousin"))
            .unwrap();

        let rel = engine.get_relationship(outcome.id).unwrap();
        assert_eq!(rel.sub_type.as_deref(), Some("other"));
        assert_eq!(rel.origin_role, Role::Relative);
        assert_eq!(rel.destination_role, Role::Relative);
        assert_eq!(
            rel.attributes.get(ATTR_REQUESTED_SUB_TYPE).map(String::as_str),
            Some("cousin")
        );
    }

    #[test]
    fn test_create_missing_actor() {
        let (mut engine, ids) = engine_with(&[Gender::Male]);
        let err = engine
            .create_relationship(NewRelationship::family(ids[0], ActorId::new(), "sibling"))
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
        assert_eq!(engine.store().write_count(), 0);
    }

    #[test]
    fn test_create_deleted_actor() {
        let (mut engine, ids) = engine_with(&[Gender::Male, Gender::Female]);
        engine.store_mut().soft_delete_actor(ids[1], 10).unwrap();

        let err = engine
            .create_relationship(NewRelationship::family(ids[0], ids[1], "spouse"))
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[test]
    fn test_notes_limit() {
        let (engine, ids) = engine_with(&[Gender::Male, Gender::Female]);
        let mut engine = RelationshipEngine::with_config(
            engine.into_store(),
            EngineConfig {
                max_notes_len: 5,
                ..EngineConfig::default()
            },
        )
        .unwrap();

        let err = engine
            .create_relationship(
                NewRelationship::family(ids[0], ids[1], "spouse").with_notes("far too long"),
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(engine.store().write_count(), 0);
    }

    #[test]
    fn test_one_way_link() {
        let (mut engine, ids) = engine_with(&[Gender::Male, Gender::Female]);
        let outcome = engine
            .create_relationship(
                NewRelationship::new(ids[0], ids[1], RelationshipType::Referral).one_way(),
            )
            .unwrap();

        let rel = engine.get_relationship(outcome.id).unwrap();
        assert!(!rel.is_bidirectional);
        assert_eq!(rel.origin_role, Role::Referrer);
        assert_eq!(rel.destination_role, Role::Referred);
    }

    #[test]
    fn test_reclassify_records_history() {
        let (mut engine, ids) = engine_with(&[Gender::Female, Gender::Male]);
        let outcome = engine
            .create_relationship(NewRelationship::family(ids[0], ids[1], "sibling"))
            .unwrap();

        engine.reclassify_relationship(outcome.id, "child").unwrap();

        let rel = engine.get_relationship(outcome.id).unwrap();
        assert_eq!(rel.sub_type.as_deref(), Some("child"));
        assert_eq!(rel.origin_role, Role::Mother);
        assert_eq!(rel.destination_role, Role::Child);
        assert_eq!(rel.start_date, 1_000);
        assert_eq!(
            rel.attributes.get(ATTR_PREVIOUS_SUB_TYPE).map(String::as_str),
            Some("sibling")
        );
        assert_eq!(
            rel.attributes.get(ATTR_RECLASSIFIED_AT).map(String::as_str),
            Some("1000")
        );
    }

    #[test]
    fn test_reclassify_uses_live_gender() {
        let (mut engine, ids) = engine_with(&[Gender::Unspecified, Gender::Male]);
        let outcome = engine
            .create_relationship(NewRelationship::family(ids[0], ids[1], "child"))
            .unwrap();
        assert_eq!(engine.get_relationship(outcome.id).unwrap().origin_role, Role::Parent);

        let mut corrected = engine.store().get_actor(ids[0]).unwrap().unwrap();
        corrected.gender = Gender::Male;
        engine.store_mut().upsert_actor(&corrected);

        // Stored roles are not recomputed on read
        assert_eq!(engine.get_relationship(outcome.id).unwrap().origin_role, Role::Parent);

        engine.reclassify_relationship(outcome.id, "child").unwrap();
        assert_eq!(engine.get_relationship(outcome.id).unwrap().origin_role, Role::Father);
    }

    #[test]
    fn test_reclassify_ended_is_invalid_state() {
        let (mut engine, ids) = engine_with(&[Gender::Male, Gender::Female]);
        let outcome = engine
            .create_relationship(NewRelationship::family(ids[0], ids[1], "sibling"))
            .unwrap();
        engine.end_relationship(outcome.id, None).unwrap();

        let err = engine.reclassify_relationship(outcome.id, "spouse").unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidState {
                state: LifecycleState::Ended,
                operation: Operation::Reclassify,
                ..
            }
        ));
    }

    #[test]
    fn test_end_date_validation() {
        let (mut engine, ids) = engine_with(&[Gender::Male, Gender::Female]);
        let outcome = engine
            .create_relationship(NewRelationship::family(ids[0], ids[1], "sibling"))
            .unwrap();

        let err = engine.end_relationship(outcome.id, Some(999)).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));

        engine.end_relationship(outcome.id, Some(5_000)).unwrap();
        assert_eq!(engine.get_relationship(outcome.id).unwrap().end_date, Some(5_000));
    }

    #[test]
    fn test_check_end_date_backdating() {
        let strict = EngineConfig::strict();
        assert!(check_end_date(&strict, Some(50), 10, 100).is_err());
        assert_eq!(check_end_date(&strict, None, 10, 100).unwrap(), 100);

        let default = EngineConfig::default();
        assert_eq!(check_end_date(&default, Some(50), 10, 100).unwrap(), 50);
    }

    #[test]
    fn test_end_date_beyond_storable_range() {
        let config = EngineConfig::default();
        assert!(matches!(
            check_end_date(&config, Some(u64::MAX), 10, 100),
            Err(EngineError::Validation(_))
        ));
        let limit = i64::MAX as Timestamp;
        assert_eq!(check_end_date(&config, Some(limit), 10, 100).unwrap(), limit);
    }

    #[test]
    fn test_with_config_rejects_invalid_config() {
        let config = EngineConfig {
            exclusive_sub_types: vec!["other".to_string()],
            ..EngineConfig::default()
        };
        let result = RelationshipEngine::with_config(MemoryStore::new(), config);
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn test_get_missing_relationship() {
        let (engine, _) = engine_with(&[]);
        assert!(matches!(
            engine.get_relationship(RelationshipId::new()),
            Err(EngineError::NotFound(_))
        ));
    }
}
