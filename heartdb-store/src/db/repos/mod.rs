//! Repository implementations for database access
//!
//! Each repository follows these patterns:
//! - Borrows the [`ConnectionManager`] and connects lazily on first use
//! - One storage operation per method, no check-then-insert
//! - Absence is `None` or an empty `Vec`, never an error
//! - Surrogate ids are parsed before anything touches storage

pub mod audit_logs;
pub mod encounters;
pub mod patients;

pub use audit_logs::AuditLogRepo;
pub use ecg_tests::EcgTestRepo;
pub use encounters::EncounterRepo;
pub use patients::PatientRepo;

use bson::oid::ObjectId;
use bson::{doc, Document};
use heartdb_core::Record;

use super::connection::ConnectionManager;
use super::store::FindQuery;
use crate::error::{StoreError, StoreResult};

/// Parse a caller-supplied surrogate id.
pub(crate) fn parse_object_id(value: &str) -> StoreResult<ObjectId> {
    ObjectId::parse_str(value).map_err(|source| StoreError::MalformedId {
        value: value.to_string(),
        source,
    })
}

/// Insert `record` and return it with its new `_id` filled in.
pub(crate) async fn insert_record<T: Record>(
    conn: &ConnectionManager,
    mut record: T,
) -> StoreResult<T> {
    let document = bson::to_document(&record)?;
    let store = conn.connect().await?;
    let id = store.insert_one(T::COLLECTION, document).await?;
    record.set_object_id(id);
    Ok(record)
}

pub(crate) async fn find_record<T: Record>(
    conn: &ConnectionManager,
    filter: Document,
) -> StoreResult<Option<T>> {
    let store = conn.connect().await?;
    store
        .find_one(T::COLLECTION, filter)
        .await?
        .map(bson::from_document)
        .transpose()
        .map_err(StoreError::from)
}

pub(crate) async fn find_records<T: Record>(
    conn: &ConnectionManager,
    query: FindQuery,
) -> StoreResult<Vec<T>> {
    let store = conn.connect().await?;
    store
        .find(T::COLLECTION, query)
        .await?
        .into_iter()
        .map(|document| bson::from_document(document).map_err(StoreError::from))
        .collect()
}

/// Exact match on the record's business id.
pub(crate) fn key_filter<T: Record>(business_id: &str) -> Document {
    let mut filter = Document::new();
    filter.insert(T::KEY_FIELD, business_id);
    filter
}

pub(crate) fn object_id_filter(id: ObjectId) -> Document {
    doc! { "_id": id }
}

/// Delete by business id; true when exactly one document went away.
pub(crate) async fn delete_record<T: Record>(
    conn: &ConnectionManager,
    business_id: &str,
) -> StoreResult<bool> {
    let store = conn.connect().await?;
    let deleted = store
        .delete_one(T::COLLECTION, key_filter::<T>(business_id))
        .await?;
    Ok(deleted == 1)
}
