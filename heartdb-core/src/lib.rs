//! heartdb-core: record schemas and shared plumbing for the heartdb store.
//!
//! The four persisted record types live in [`models`]. Field names on these
//! types are the persisted document field names; other tools query the
//! collections by them, so they must not be renamed.

pub mod config;
pub mod error;
pub mod ids;
pub mod models;
pub mod pagination;

pub use config::{DatabaseConfig, HeartConfig, LoggingConfig};
pub use error::{CoreError, Result};
pub use ids::RecordKind;
pub use models::{
    AuditLog, EcgStatistics, EcgTest, Encounter, NewAuditLog, NewEcgTest, NewEncounter,
    NewPatient, Patient, PatientPatch, Record,
};
pub use pagination::Pagination;
