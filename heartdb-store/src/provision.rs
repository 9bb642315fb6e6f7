//! One-time collection and index setup.
//!
//! Run once per deployment (the CLI `provision` command), not on every
//! start. Every step is safe to repeat.

use heartdb_core::{AuditLog, EcgTest, Encounter, Patient, Record};
use serde::Serialize;
use tracing::info;

use crate::db::connection::ConnectionManager;
use crate::db::store::{IndexSpec, SortOrder};
use crate::error::StoreResult;

/// Indexes declared on one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionPlan {
    pub collection: &'static str,
    pub indexes: Vec<IndexSpec>,
}

/// What a provisioning run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProvisionReport {
    pub collections: Vec<String>,
    pub indexes: Vec<String>,
}

/// The full index plan, one entry per collection.
pub fn index_plan() -> Vec<CollectionPlan> {
    use SortOrder::{Ascending as Asc, Descending as Desc};

    vec![
        CollectionPlan {
            collection: Patient::COLLECTION,
            indexes: vec![
                IndexSpec::unique(Patient::KEY_FIELD),
                IndexSpec::new(&[("last_name", Asc), ("first_name", Asc)]),
                IndexSpec::ascending("dob"),
                IndexSpec::ascending("gender"),
            ],
        },
        CollectionPlan {
            collection: Encounter::COLLECTION,
            indexes: vec![
                IndexSpec::unique(Encounter::KEY_FIELD),
                IndexSpec::ascending("patient_id"),
                IndexSpec::ascending("visit_date"),
                IndexSpec::ascending("doctor"),
                IndexSpec::new(&[("patient_id", Asc), ("visit_date", Desc)]),
            ],
        },
        CollectionPlan {
            collection: EcgTest::COLLECTION,
            indexes: vec![
                IndexSpec::unique(EcgTest::KEY_FIELD),
                IndexSpec::ascending("encounter_id"),
                IndexSpec::ascending("patient_id"),
                IndexSpec::ascending("test_date"),
                IndexSpec::ascending("target"),
                IndexSpec::new(&[("patient_id", Asc), ("test_date", Desc)]),
            ],
        },
        CollectionPlan {
            collection: AuditLog::COLLECTION,
            indexes: vec![
                IndexSpec::unique(AuditLog::KEY_FIELD),
                IndexSpec::ascending("action"),
                IndexSpec::new(&[("object_type", Asc), ("object_id", Asc)]),
                IndexSpec::new(&[("logged_at", Desc)]),
                IndexSpec::ascending("user_id"),
            ],
        },
    ]
}

/// Create the four collections. Existing ones are left alone.
pub async fn create_collections(conn: &ConnectionManager) -> StoreResult<Vec<String>> {
    let store = conn.connect().await?;
    let mut created = Vec::new();
    for plan in index_plan() {
        store.create_collection(plan.collection).await?;
        info!(collection = plan.collection, "Collection ready");
        created.push(plan.collection.to_string());
    }
    Ok(created)
}

/// Declare every index in [`index_plan`]. Returns `collection.index` names.
pub async fn create_indexes(conn: &ConnectionManager) -> StoreResult<Vec<String>> {
    let store = conn.connect().await?;
    let mut declared = Vec::new();
    for plan in index_plan() {
        for index in &plan.indexes {
            store.create_index(plan.collection, index).await?;
            declared.push(format!("{}.{}", plan.collection, index.name()));
        }
        info!(
            collection = plan.collection,
            count = plan.indexes.len(),
            "Indexes ready"
        );
    }
    Ok(declared)
}

/// Collections, then indexes.
pub async fn run(conn: &ConnectionManager) -> StoreResult<ProvisionReport> {
    let collections = create_collections(conn).await?;
    let indexes = create_indexes(conn).await?;
    info!(
        collections = collections.len(),
        indexes = indexes.len(),
        target = %conn.describe(),
        "Provisioning complete"
    );
    Ok(ProvisionReport {
        collections,
        indexes,
    })
}
