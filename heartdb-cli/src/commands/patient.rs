//! Patient command - look up, list and delete patients

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use heartdb_core::{NewAuditLog, Pagination};
use heartdb_store::{AuditLogRepo, ConnectionManager, PatientRepo};

use super::print_json;

#[derive(Parser, Debug)]
pub struct PatientArgs {
    #[command(subcommand)]
    pub command: PatientCommand,
}

#[derive(Subcommand, Debug)]
pub enum PatientCommand {
    /// Show one patient
    Get {
        /// Patient ID (e.g. PAT_...)
        patient_id: String,
    },
    /// List patients one page at a time
    List {
        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Patients per page
        #[arg(long, default_value_t = 50)]
        per_page: u32,
    },
    /// Delete a patient (encounters and ECG tests are kept)
    Delete {
        /// Patient ID (e.g. PAT_...)
        patient_id: String,
    },
}

pub async fn run_patient(args: PatientArgs, conn: &ConnectionManager) -> Result<()> {
    let repo = PatientRepo::new(conn);

    match args.command {
        PatientCommand::Get { patient_id } => {
            let patient = repo
                .find_by_id(&patient_id)
                .await
                .context("Failed to look up patient")?;
            match patient {
                Some(patient) => print_json(&patient)?,
                None => bail!("Patient not found: {patient_id}"),
            }
        }

        PatientCommand::List { page, per_page } => {
            let patients = repo
                .find_all(Pagination::new(page, per_page))
                .await
                .context("Failed to list patients")?;
            print_json(&patients)?;
        }

        PatientCommand::Delete { patient_id } => {
            let deleted = repo
                .delete(&patient_id)
                .await
                .context("Failed to delete patient")?;
            if !deleted {
                bail!("Patient not found: {patient_id}");
            }

            AuditLogRepo::new(conn)
                .create(NewAuditLog::new("delete", "patient", &patient_id))
                .await
                .context("Failed to record audit entry")?;

            print_json(&serde_json::json!({ "deleted": patient_id }))?;
        }
    }

    Ok(())
}
