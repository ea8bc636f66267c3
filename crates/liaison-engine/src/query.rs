//! Relationship reads from one actor's point of view
//!
//! Relationships are stored origin/destination, but callers ask "who is
//! related to this actor". The read path matches the actor on either side,
//! joins identity data for both parties in one batch, and tags which side
//! the viewer is on.

use std::collections::{BTreeSet, HashMap};

use liaison_domain::traits::{RelationshipQuery, RelationshipStore};
use liaison_domain::{
    ActorId, ActorSummary, LifecycleState, Relationship, RelationshipType, Role,
};

use crate::error::storage;
use crate::{EngineError, RelationshipEngine};

/// Which party of a relationship the viewer is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Viewer is the origin
    Origin,
    /// Viewer is the destination
    Destination,
}

impl Side {
    /// The other party's side
    pub fn opposite(&self) -> Side {
        match self {
            Side::Origin => Side::Destination,
            Side::Destination => Side::Origin,
        }
    }

    /// Get the side name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Origin => "origin",
            Side::Destination => "destination",
        }
    }
}

/// A relationship plus identity data for both parties
///
/// `origin`/`destination` are `None` only if the actor row is gone from the
/// store entirely; soft-deleted actors still appear, flagged.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRelationship {
    /// Raw stored record
    pub relationship: Relationship,

    /// Origin identity
    pub origin: Option<ActorSummary>,

    /// Destination identity
    pub destination: Option<ActorSummary>,

    /// Actor the list was requested for
    pub viewer: ActorId,

    /// Side the viewer is on
    pub viewer_side: Side,

    /// `end_date` and `deleted_at` both null
    pub is_current: bool,

    /// Lifecycle state at read time
    pub state: LifecycleState,
}

impl EnrichedRelationship {
    fn new(
        relationship: Relationship,
        viewer: ActorId,
        actors: &HashMap<ActorId, ActorSummary>,
    ) -> Self {
        let viewer_side = if relationship.origin_actor_id == viewer {
            Side::Origin
        } else {
            Side::Destination
        };

        Self {
            origin: actors.get(&relationship.origin_actor_id).cloned(),
            destination: actors.get(&relationship.destination_actor_id).cloned(),
            is_current: relationship.is_current(),
            state: relationship.state(),
            viewer,
            viewer_side,
            relationship,
        }
    }

    fn party(&self, side: Side) -> Option<&ActorSummary> {
        match side {
            Side::Origin => self.origin.as_ref(),
            Side::Destination => self.destination.as_ref(),
        }
    }

    fn role(&self, side: Side) -> Role {
        match side {
            Side::Origin => self.relationship.origin_role,
            Side::Destination => self.relationship.destination_role,
        }
    }

    /// Identifier of the other party
    pub fn counterpart_id(&self) -> ActorId {
        match self.viewer_side {
            Side::Origin => self.relationship.destination_actor_id,
            Side::Destination => self.relationship.origin_actor_id,
        }
    }

    /// Identity of the other party
    pub fn counterpart(&self) -> Option<&ActorSummary> {
        self.party(self.viewer_side.opposite())
    }

    /// Identity of the viewer
    pub fn viewer_summary(&self) -> Option<&ActorSummary> {
        self.party(self.viewer_side)
    }

    /// Role the viewer holds
    pub fn viewer_role(&self) -> Role {
        self.role(self.viewer_side)
    }

    /// Role the other party holds
    pub fn counterpart_role(&self) -> Role {
        self.role(self.viewer_side.opposite())
    }
}

/// Optional narrowing of an actor's relationship list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationshipFilter {
    /// Drop ended relationships
    pub only_current: bool,

    /// Keep only one category
    pub relationship_type: Option<RelationshipType>,
}

impl Default for RelationshipFilter {
    fn default() -> Self {
        Self {
            only_current: true,
            relationship_type: None,
        }
    }
}

impl<S: RelationshipStore> RelationshipEngine<S> {
    /// All non-deleted relationships touching `actor` from either side
    ///
    /// With `only_current`, ended relationships are dropped too. Order
    /// follows the store and is stable for a given snapshot. An actor with no
    /// relationships (or an unknown id) yields an empty list.
    pub fn list_relationships_for_actor(
        &self,
        actor: ActorId,
        only_current: bool,
    ) -> Result<Vec<EnrichedRelationship>, EngineError> {
        self.list_relationships_for_actor_filtered(
            actor,
            RelationshipFilter {
                only_current,
                relationship_type: None,
            },
        )
    }

    /// [`Self::list_relationships_for_actor`] with a category filter
    pub fn list_relationships_for_actor_filtered(
        &self,
        actor: ActorId,
        filter: RelationshipFilter,
    ) -> Result<Vec<EnrichedRelationship>, EngineError> {
        let query = RelationshipQuery {
            either_party: Some(actor),
            relationship_type: filter.relationship_type,
            only_open: filter.only_current,
            ..Default::default()
        };
        let relationships = self.store.find_relationships(&query).map_err(storage)?;
        if relationships.is_empty() {
            return Ok(Vec::new());
        }

        let party_ids: Vec<ActorId> = relationships
            .iter()
            .flat_map(|r| [r.origin_actor_id, r.destination_actor_id])
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let actors: HashMap<ActorId, ActorSummary> = self
            .store
            .get_actors(&party_ids)
            .map_err(storage)?
            .into_iter()
            .map(|a| (a.id, a.summary()))
            .collect();

        tracing::debug!(
            "Listed {} relationships for actor {} (only_current={})",
            relationships.len(),
            actor,
            filter.only_current
        );

        Ok(relationships
            .into_iter()
            .map(|r| EnrichedRelationship::new(r, actor, &actors))
            .collect())
    }
}
