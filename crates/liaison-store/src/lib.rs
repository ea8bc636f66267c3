//! Liaison Storage Layer
//!
//! Implements the `RelationshipStore` trait from `liaison-domain`.
//!
//! # Backends
//!
//! - [`SqliteStore`]: persistent storage. Each atomic unit runs inside a
//!   `BEGIN IMMEDIATE` transaction, and a partial unique index on active
//!   exclusive relationships backstops the close-then-create ordering.
//! - [`MemoryStore`]: in-process double with snapshot rollback, a write
//!   counter, and fault injection.
//!
//! # Examples
//!
//! ```no_run
//! use liaison_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for relationship operations
//! ```

#![warn(missing_docs)]

mod error;
mod memory;
mod sqlite;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use sqlite::{SqliteRepo, SqliteStore};
