//! Audit command - read the audit trail

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use heartdb_store::db::repos::audit_logs::DEFAULT_RECENT_LIMIT;
use heartdb_store::{AuditLogRepo, ConnectionManager};

use super::print_json;

#[derive(Parser, Debug)]
pub struct AuditArgs {
    #[command(subcommand)]
    pub command: AuditCommand,
}

#[derive(Subcommand, Debug)]
pub enum AuditCommand {
    /// Newest audit entries first
    Recent {
        /// Number of entries to show
        #[arg(long, default_value_t = DEFAULT_RECENT_LIMIT)]
        limit: i64,
    },
    /// History of one record
    Object {
        /// Record type (e.g. patient, encounter, ecg_test)
        object_type: String,
        /// Business id of the record
        object_id: String,
    },
}

pub async fn run_audit(args: AuditArgs, conn: &ConnectionManager) -> Result<()> {
    let repo = AuditLogRepo::new(conn);

    let entries = match args.command {
        AuditCommand::Recent { limit } => repo
            .find_recent(limit)
            .await
            .context("Failed to load recent audit entries")?,
        AuditCommand::Object {
            object_type,
            object_id,
        } => repo
            .find_by_object(&object_type, &object_id)
            .await
            .context("Failed to load audit history")?,
    };

    print_json(&entries)
}
