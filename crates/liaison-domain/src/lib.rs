//! Liaison Domain Layer
//!
//! This crate contains the domain model for the actor relationship engine.
//! It defines the fundamental value objects, the role reciprocity table, the
//! lifecycle state machine, and the trait interfaces for the storage layer.
//!
//! ## Key Concepts
//!
//! - **Actor**: A person or organization; owned by collaborator subsystems
//! - **Relationship**: A direct link between exactly two actors, with roles
//!   derived from the sub-type and the origin's gender
//! - **Assignment**: An actor's hold on a share (owner, titleholder, beneficiary)
//! - **Lifecycle**: Active → Ended → SoftDeleted, with SoftDeleted terminal
//!
//! ## Architecture
//!
//! - Only `uuid` as an external dependency
//! - Pure logic only; no I/O
//! - Storage implementations live in `liaison-store`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod actor;
pub mod assignment;
pub mod id;
pub mod lifecycle;
pub mod relationship;
pub mod roles;
pub mod traits;

/// Unix timestamp in seconds
pub type Timestamp = u64;

// Re-exports for convenience
pub use actor::{Actor, ActorKind, ActorSummary, Gender};
pub use assignment::{Assignment, AssignmentType};
pub use id::{ActorId, AssignmentId, RelationshipId, ShareId};
pub use lifecycle::{LifecycleState, Operation, TransitionError};
pub use relationship::{Attributes, FamilySubType, Relationship, RelationshipType};
pub use roles::{Role, RolePair};
