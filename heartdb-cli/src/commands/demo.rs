//! Demo command - write the sample patient and its audit entry

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use heartdb_core::{NewAuditLog, NewPatient};
use heartdb_store::{AuditLogRepo, ConnectionManager, PatientRepo};
use serde_json::json;

use super::print_json;

pub async fn run_demo(conn: &ConnectionManager) -> Result<()> {
    let dob = Utc
        .with_ymd_and_hms(1980, 5, 15, 0, 0, 0)
        .single()
        .context("Invalid sample date of birth")?;

    let patient = PatientRepo::new(conn)
        .create(NewPatient {
            first_name: "John".into(),
            last_name: "Doe".into(),
            dob,
            gender: "Male".into(),
        })
        .await
        .context("Failed to create sample patient")?;

    AuditLogRepo::new(conn)
        .create(
            NewAuditLog::new("create", "patient", &patient.patient_id)
                .with_user("heartdb-demo")
                .with_details(json!({ "source": "demo" })),
        )
        .await
        .context("Failed to record audit entry")?;

    print_json(&patient)
}
