//! Uniqueness invariant enforcement
//!
//! An origin actor may hold at most one active relationship of an exclusive
//! sub-type. Before a new or reclassified relationship becomes active, every
//! other active match is closed (its `end_date` set), never soft-deleted: the
//! superseded link stays historically valid up to the close time.

use liaison_domain::lifecycle::transition;
use liaison_domain::traits::{RelationshipQuery, RelationshipRepository, StorageFailure};
use liaison_domain::{ActorId, Operation, RelationshipId, RelationshipType, Timestamp};

use crate::error::storage;
use crate::{EngineConfig, EngineError};

/// Close every active relationship that would clash with a new exclusive one
///
/// Returns the ids that were closed, in store order. Non-exclusive
/// (category, sub-type) pairs return an empty list without touching storage.
/// `exclude` skips the relationship being edited in place.
///
/// Must run on the same scoped repository as the write it protects so that a
/// failure of that write rolls the close-outs back too.
pub fn enforce_exclusivity<E: StorageFailure>(
    repo: &mut dyn RelationshipRepository<Error = E>,
    config: &EngineConfig,
    origin: ActorId,
    relationship_type: RelationshipType,
    sub_type: Option<&str>,
    exclude: Option<RelationshipId>,
    now: Timestamp,
) -> Result<Vec<RelationshipId>, EngineError> {
    if !config.is_exclusive(relationship_type, sub_type) {
        return Ok(Vec::new());
    }

    let query = RelationshipQuery {
        origin: Some(origin),
        relationship_type: Some(relationship_type),
        sub_type: sub_type.map(str::to_string),
        only_open: true,
        exclude_id: exclude,
        ..Default::default()
    };
    let matches = repo.find_relationships(&query).map_err(storage)?;

    let mut closed = Vec::with_capacity(matches.len());
    for mut rel in matches {
        transition(rel.state(), Operation::End)
            .map_err(|e| EngineError::invalid_state("relationship", rel.id, e))?;

        // A close time earlier than the start would break end >= start
        rel.end_date = Some(now.max(rel.start_date));
        rel.updated_at = now;
        repo.update_relationship(&rel).map_err(storage)?;

        tracing::debug!(
            "Closed relationship {} (origin {}, sub-type {:?}) superseded by exclusivity",
            rel.id,
            origin,
            sub_type
        );
        closed.push(rel.id);
    }

    Ok(closed)
}
