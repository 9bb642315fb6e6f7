//! Encounter repository
//!
//! Only `notes` can change after creation.

use bson::doc;
use heartdb_core::models::now;
use heartdb_core::{Encounter, NewEncounter, Record};
use tracing::{debug, info};

use super::{
    delete_record, find_record, find_records, insert_record, key_filter, object_id_filter,
    parse_object_id,
};
use crate::db::connection::ConnectionManager;
use crate::db::store::FindQuery;
use crate::error::StoreResult;

pub struct EncounterRepo<'a> {
    conn: &'a ConnectionManager,
}

impl<'a> EncounterRepo<'a> {
    pub fn new(conn: &'a ConnectionManager) -> Self {
        Self { conn }
    }

    /// Insert a new encounter with a fresh `ENC_` id. The referenced patient
    /// is not checked.
    pub async fn create(&self, input: NewEncounter) -> StoreResult<Encounter> {
        let encounter = Encounter::from_new(Encounter::KIND.new_id(), input, now());
        let encounter = insert_record(self.conn, encounter).await?;
        info!(
            encounter_id = %encounter.encounter_id,
            patient_id = %encounter.patient_id,
            "Created encounter"
        );
        Ok(encounter)
    }

    /// A patient's encounters, most recent visit first.
    pub async fn find_by_patient_id(&self, patient_id: &str) -> StoreResult<Vec<Encounter>> {
        debug!(patient_id, "Listing encounters");
        let query = FindQuery::new(doc! { "patient_id": patient_id }).sort_desc("visit_date");
        find_records(self.conn, query).await
    }

    pub async fn find_by_id(&self, encounter_id: &str) -> StoreResult<Option<Encounter>> {
        find_record(self.conn, key_filter::<Encounter>(encounter_id)).await
    }

    pub async fn find_by_object_id(&self, object_id: &str) -> StoreResult<Option<Encounter>> {
        let id = parse_object_id(object_id)?;
        find_record(self.conn, object_id_filter(id)).await
    }

    /// Replace the notes; false when no encounter has this id.
    ///
    /// Writing the notes an encounter already has still counts as an update.
    pub async fn update_notes(&self, encounter_id: &str, notes: &str) -> StoreResult<bool> {
        let store = self.conn.connect().await?;
        let outcome = store
            .update_one(
                Encounter::COLLECTION,
                key_filter::<Encounter>(encounter_id),
                doc! { "notes": notes },
            )
            .await?;

        let updated = outcome.matched == 1;
        if updated {
            info!(encounter_id, "Updated encounter notes");
        }
        Ok(updated)
    }

    pub async fn delete(&self, encounter_id: &str) -> StoreResult<bool> {
        let deleted = delete_record::<Encounter>(self.conn, encounter_id).await?;
        if deleted {
            info!(encounter_id, "Deleted encounter");
        }
        Ok(deleted)
    }
}
