//! Patient repository
//!
//! The only repository with a general partial update. Every update refreshes
//! `updated_at`, even when the patch is empty.

use bson::doc;
use heartdb_core::models::now;
use heartdb_core::{NewPatient, Pagination, Patient, PatientPatch, Record};
use tracing::{debug, info};

use super::{
    delete_record, find_record, find_records, insert_record, key_filter, object_id_filter,
    parse_object_id,
};
use crate::db::connection::ConnectionManager;
use crate::db::store::FindQuery;
use crate::error::StoreResult;

pub struct PatientRepo<'a> {
    conn: &'a ConnectionManager,
}

impl<'a> PatientRepo<'a> {
    pub fn new(conn: &'a ConnectionManager) -> Self {
        Self { conn }
    }

    /// Insert a new patient with a fresh `PAT_` id.
    pub async fn create(&self, input: NewPatient) -> StoreResult<Patient> {
        let patient = Patient::from_new(Patient::KIND.new_id(), input, now());
        let patient = insert_record(self.conn, patient).await?;
        info!(patient_id = %patient.patient_id, "Created patient");
        Ok(patient)
    }

    pub async fn find_by_id(&self, patient_id: &str) -> StoreResult<Option<Patient>> {
        debug!(patient_id, "Looking up patient");
        find_record(self.conn, key_filter::<Patient>(patient_id)).await
    }

    pub async fn find_by_object_id(&self, object_id: &str) -> StoreResult<Option<Patient>> {
        let id = parse_object_id(object_id)?;
        find_record(self.conn, object_id_filter(id)).await
    }

    /// Exact match on both names. No defined order.
    pub async fn find_by_name(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> StoreResult<Vec<Patient>> {
        let filter = doc! { "first_name": first_name, "last_name": last_name };
        find_records(self.conn, FindQuery::new(filter)).await
    }

    /// One page of patients in storage order.
    pub async fn find_all(&self, page: Pagination) -> StoreResult<Vec<Patient>> {
        let query = FindQuery::default().skip(page.skip()).limit(page.limit());
        find_records(self.conn, query).await
    }

    /// Apply `patch`; false when no patient has this id.
    pub async fn update(&self, patient_id: &str, patch: &PatientPatch) -> StoreResult<bool> {
        let store = self.conn.connect().await?;
        let outcome = store
            .update_one(
                Patient::COLLECTION,
                key_filter::<Patient>(patient_id),
                patch.to_set_document(now()),
            )
            .await?;

        let updated = outcome.matched == 1;
        if updated {
            info!(patient_id, "Updated patient");
        }
        Ok(updated)
    }

    /// Delete by business id; false when nothing matched.
    pub async fn delete(&self, patient_id: &str) -> StoreResult<bool> {
        let deleted = delete_record::<Patient>(self.conn, patient_id).await?;
        if deleted {
            info!(patient_id, "Deleted patient");
        }
        Ok(deleted)
    }
}
