//! Database layer - connection lifecycle, storage backends and repositories
//!
//! # Design Principles
//!
//! - One owned [`ConnectionManager`] per process, lent to repositories
//! - Storage reached through the [`DocumentStore`] trait, MongoDB in production
//! - Rely on unique indexes and surface conflicts - no check-then-insert
//! - No cross-record transactions; referential links are not checked

pub mod backends;
pub mod connection;
pub mod repos;
pub mod store;

pub use backends::{MemoryStore, MongoStore};
pub use connection::{ConnectionManager, StoreHandle};
pub use repos::*;
pub use store::{DocumentStore, FindQuery, GroupSpec, IndexSpec, SortOrder, UpdateOutcome};
