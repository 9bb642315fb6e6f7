//! heartdb-store: data access for the heartdb clinical store
//!
//! A [`ConnectionManager`] owns the single database handle. Repositories
//! borrow it and issue exactly one storage operation per call; nothing here
//! batches, retries or coordinates across records.
//!
//! ```ignore
//! let conn = ConnectionManager::new(config.database.clone());
//! let patients = PatientRepo::new(&conn);
//! let patient = patients.create(new_patient).await?;
//! conn.close().await;
//! ```

pub mod db;
pub mod error;
pub mod provision;

pub use db::{
    AuditLogRepo, ConnectionManager, DocumentStore, EcgTestRepo, EncounterRepo, MemoryStore,
    MongoStore, PatientRepo, StoreHandle,
};
pub use error::{StoreError, StoreResult};
