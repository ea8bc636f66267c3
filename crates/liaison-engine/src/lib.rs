//! Liaison Engine
//!
//! Lifecycle, exclusivity and read-path logic for direct relationships
//! between actors, plus the parallel share-assignment lifecycle.
//!
//! # Overview
//!
//! The engine is responsible for:
//! - **Linking**: creating relationships with roles derived from the sub-type
//!   and the origin actor's gender
//! - **Exclusivity**: closing an origin's prior active link of an exclusive
//!   sub-type (spouse, parent, parent-in-law) before a new one is admitted
//! - **Lifecycle**: reclassify, end and soft-delete through one transition
//!   function, so illegal moves are rejected in one place
//! - **Reads**: listing an actor's relationships from either side with
//!   identity data for both parties
//!
//! # Lifecycle
//!
//! | State | `end_date` | `deleted_at` | Allowed operations |
//! |-------|-----------|--------------|--------------------|
//! | **Active** | null | null | reclassify, end, soft-delete |
//! | **Ended** | set | null | soft-delete |
//! | **SoftDeleted** | any | set | none (audit read only) |
//!
//! # Atomicity
//!
//! Create and reclassify run the exclusivity close-out and the write it
//! protects inside one [`RelationshipStore::atomically`] unit. If the write
//! fails, the close-outs are rolled back with it.
//!
//! [`RelationshipStore::atomically`]: liaison_domain::traits::RelationshipStore::atomically
//!
//! # Usage
//!
//! ```no_run
//! use liaison_domain::{Actor, Gender};
//! use liaison_engine::{NewRelationship, RelationshipEngine};
//! use liaison_store::SqliteStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut store = SqliteStore::new("liaison.db")?;
//! let ana = Actor::person("Ana", Gender::Female);
//! let luis = Actor::person("Luis", Gender::Male);
//! store.upsert_actor(&ana)?;
//! store.upsert_actor(&luis)?;
//!
//! let mut engine = RelationshipEngine::new(store);
//! let link = engine.create_relationship(NewRelationship::family(ana.id, luis.id, "spouse"))?;
//!
//! for view in engine.list_relationships_for_actor(luis.id, true)? {
//!     println!("{} is {}", view.counterpart_role(), view.viewer_role());
//! }
//! engine.end_relationship(link.id, None)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration Presets
//!
//! ```
//! use liaison_engine::EngineConfig;
//!
//! // Default: spouse, parent and parents-in-law are exclusive
//! let config = EngineConfig::default();
//!
//! // Strict: children-in-law too, and no backdated end dates
//! let config = EngineConfig::strict();
//!
//! // Permissive: nothing is exclusive
//! let config = EngineConfig::permissive();
//! ```

#![warn(missing_docs)]

pub mod assignment;
pub mod clock;
pub mod config;
pub mod error;
pub mod exclusivity;
pub mod lifecycle;
pub mod query;

pub use assignment::{AssignOutcome, ExclusivityPolicy, NewAssignment};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::EngineConfig;
pub use error::EngineError;
pub use exclusivity::enforce_exclusivity;
pub use lifecycle::{parse_category, LinkOutcome, NewRelationship, RelationshipEngine};
pub use query::{EnrichedRelationship, RelationshipFilter, Side};
