//! Write conflicts surfaced through engine operations
//!
//! `RacingStore` commits a rival row between the exclusivity lookup and the
//! engine's own write, the interleaving a second writer would produce. The
//! store's uniqueness backstop must then report `EngineError::Conflict` and
//! roll the whole unit back.

use std::sync::Arc;

use liaison_domain::roles::{Role, RolePair};
use liaison_domain::traits::{
    AssignmentQuery, RelationshipQuery, RelationshipRepository, RelationshipStore,
};
use liaison_domain::{
    Actor, ActorId, Assignment, AssignmentId, Gender, Relationship, RelationshipId,
    RelationshipType,
};
use liaison_engine::{EngineError, FixedClock, NewRelationship, RelationshipEngine};
use liaison_store::{MemoryStore, SqliteStore, StoreError};

struct RacingStore<S> {
    inner: S,
    rival: Option<Relationship>,
}

impl<S> RacingStore<S> {
    fn new(inner: S) -> Self {
        Self { inner, rival: None }
    }

    /// The next transaction will see `rival` appear right before its first write
    fn arm(&mut self, rival: Relationship) {
        self.rival = Some(rival);
    }
}

struct RacingRepo<'a> {
    repo: &'a mut (dyn RelationshipRepository<Error = StoreError> + 'a),
    rival: Option<Relationship>,
}

impl RacingRepo<'_> {
    fn before_write(&mut self) -> Result<(), StoreError> {
        if let Some(rival) = self.rival.take() {
            self.repo.insert_relationship(&rival)?;
        }
        Ok(())
    }
}

impl RelationshipRepository for RacingRepo<'_> {
    type Error = StoreError;

    fn get_actor(&self, id: ActorId) -> Result<Option<Actor>, StoreError> {
        self.repo.get_actor(id)
    }

    fn get_actors(&self, ids: &[ActorId]) -> Result<Vec<Actor>, StoreError> {
        self.repo.get_actors(ids)
    }

    fn get_relationship(&self, id: RelationshipId) -> Result<Option<Relationship>, StoreError> {
        self.repo.get_relationship(id)
    }

    fn find_relationships(&self, query: &RelationshipQuery) -> Result<Vec<Relationship>, StoreError> {
        self.repo.find_relationships(query)
    }

    fn insert_relationship(&mut self, relationship: &Relationship) -> Result<(), StoreError> {
        self.before_write()?;
        self.repo.insert_relationship(relationship)
    }

    fn update_relationship(&mut self, relationship: &Relationship) -> Result<(), StoreError> {
        self.before_write()?;
        self.repo.update_relationship(relationship)
    }

    fn get_assignment(&self, id: AssignmentId) -> Result<Option<Assignment>, StoreError> {
        self.repo.get_assignment(id)
    }

    fn find_assignments(&self, query: &AssignmentQuery) -> Result<Vec<Assignment>, StoreError> {
        self.repo.find_assignments(query)
    }

    fn insert_assignment(&mut self, assignment: &Assignment) -> Result<(), StoreError> {
        self.before_write()?;
        self.repo.insert_assignment(assignment)
    }

    fn update_assignment(&mut self, assignment: &Assignment) -> Result<(), StoreError> {
        self.before_write()?;
        self.repo.update_assignment(assignment)
    }
}

impl<S: RelationshipStore<Error = StoreError>> RelationshipRepository for RacingStore<S> {
    type Error = StoreError;

    fn get_actor(&self, id: ActorId) -> Result<Option<Actor>, StoreError> {
        self.inner.get_actor(id)
    }

    fn get_actors(&self, ids: &[ActorId]) -> Result<Vec<Actor>, StoreError> {
        self.inner.get_actors(ids)
    }

    fn get_relationship(&self, id: RelationshipId) -> Result<Option<Relationship>, StoreError> {
        self.inner.get_relationship(id)
    }

    fn find_relationships(&self, query: &RelationshipQuery) -> Result<Vec<Relationship>, StoreError> {
        self.inner.find_relationships(query)
    }

    fn insert_relationship(&mut self, relationship: &Relationship) -> Result<(), StoreError> {
        self.inner.insert_relationship(relationship)
    }

    fn update_relationship(&mut self, relationship: &Relationship) -> Result<(), StoreError> {
        self.inner.update_relationship(relationship)
    }

    fn get_assignment(&self, id: AssignmentId) -> Result<Option<Assignment>, StoreError> {
        self.inner.get_assignment(id)
    }

    fn find_assignments(&self, query: &AssignmentQuery) -> Result<Vec<Assignment>, StoreError> {
        self.inner.find_assignments(query)
    }

    fn insert_assignment(&mut self, assignment: &Assignment) -> Result<(), StoreError> {
        self.inner.insert_assignment(assignment)
    }

    fn update_assignment(&mut self, assignment: &Assignment) -> Result<(), StoreError> {
        self.inner.update_assignment(assignment)
    }
}

impl<S: RelationshipStore<Error = StoreError>> RelationshipStore for RacingStore<S> {
    fn atomically<T, E, F>(&mut self, op: F) -> Result<Result<T, E>, StoreError>
    where
        F: FnOnce(&mut dyn RelationshipRepository<Error = StoreError>) -> Result<T, E>,
    {
        let rival = self.rival.take();
        self.inner.atomically(|repo| {
            let mut racing = RacingRepo { repo, rival };
            op(&mut racing)
        })
    }
}

fn spouse(origin: ActorId, destination: ActorId, now: u64) -> Relationship {
    Relationship::active(
        origin,
        destination,
        RelationshipType::Family,
        Some("spouse".to_string()),
        RolePair::symmetric(Role::Spouse),
        true,
        None,
        now,
    )
}

fn people() -> Vec<Actor> {
    vec![
        Actor::person("Ana", Gender::Female),
        Actor::person("Luis", Gender::Male),
        Actor::person("Marta", Gender::Female),
    ]
}

fn memory_engine(actors: &[Actor]) -> RelationshipEngine<RacingStore<MemoryStore>> {
    let mut store = MemoryStore::new();
    for actor in actors {
        store.upsert_actor(actor);
    }
    RelationshipEngine::new(RacingStore::new(store)).with_clock(Arc::new(FixedClock::new(1_000)))
}

fn sqlite_engine(actors: &[Actor]) -> RelationshipEngine<RacingStore<SqliteStore>> {
    let mut store = SqliteStore::in_memory().unwrap();
    for actor in actors {
        store.upsert_actor(actor).unwrap();
    }
    RelationshipEngine::new(RacingStore::new(store)).with_clock(Arc::new(FixedClock::new(1_000)))
}

fn assert_create_conflicts<S: RelationshipStore<Error = StoreError>>(
    mut engine: RelationshipEngine<RacingStore<S>>,
    actors: &[Actor],
) {
    let (a, b, c) = (actors[0].id, actors[1].id, actors[2].id);
    engine.store_mut().arm(spouse(a, b, 500));

    let err = engine
        .create_relationship(NewRelationship::family(a, c, "spouse"))
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)), "got {:?}", err);
    assert!(!err.is_retriable());

    // Rival and new row went down with the same unit
    assert!(engine.list_relationships_for_actor(a, false).unwrap().is_empty());
}

fn assert_reclassify_conflicts<S: RelationshipStore<Error = StoreError>>(
    mut engine: RelationshipEngine<RacingStore<S>>,
    actors: &[Actor],
) {
    let (a, b, c) = (actors[0].id, actors[1].id, actors[2].id);
    let sibling = engine
        .create_relationship(NewRelationship::family(a, c, "sibling"))
        .unwrap();
    engine.store_mut().arm(spouse(a, b, 500));

    let err = engine.reclassify_relationship(sibling.id, "spouse").unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)), "got {:?}", err);

    let unchanged = engine.get_relationship(sibling.id).unwrap();
    assert_eq!(unchanged.sub_type.as_deref(), Some("sibling"));
    assert_eq!(engine.list_relationships_for_actor(a, true).unwrap().len(), 1);
}

#[test]
fn test_create_conflict_in_memory() {
    let actors = people();
    assert_create_conflicts(memory_engine(&actors), &actors);
}

#[test]
fn test_create_conflict_in_sqlite() {
    let actors = people();
    assert_create_conflicts(sqlite_engine(&actors), &actors);
}

#[test]
fn test_reclassify_conflict_in_memory() {
    let actors = people();
    assert_reclassify_conflicts(memory_engine(&actors), &actors);
}

#[test]
fn test_reclassify_conflict_in_sqlite() {
    let actors = people();
    assert_reclassify_conflicts(sqlite_engine(&actors), &actors);
}

#[test]
fn test_non_exclusive_rival_is_not_a_conflict() {
    let actors = people();
    let mut engine = sqlite_engine(&actors);
    let (a, b, c) = (actors[0].id, actors[1].id, actors[2].id);

    let mut rival = spouse(a, b, 500);
    rival.sub_type = Some("sibling".to_string());
    rival.exclusive = false;
    engine.store_mut().arm(rival);

    engine
        .create_relationship(NewRelationship::family(a, c, "spouse"))
        .unwrap();
    assert_eq!(engine.list_relationships_for_actor(a, true).unwrap().len(), 2);
}
