//! Provision command - create collections and indexes

use anyhow::{Context, Result};
use clap::Parser;
use heartdb_store::provision::{self, ProvisionReport};
use heartdb_store::ConnectionManager;

use super::print_json;

#[derive(Parser, Debug)]
pub struct ProvisionArgs {
    /// Only create the collections
    #[arg(long, conflicts_with = "indexes_only")]
    pub collections_only: bool,

    /// Only create the indexes
    #[arg(long)]
    pub indexes_only: bool,
}

pub async fn run_provision(args: ProvisionArgs, conn: &ConnectionManager) -> Result<()> {
    let report = if args.collections_only {
        ProvisionReport {
            collections: provision::create_collections(conn)
                .await
                .context("Failed to create collections")?,
            indexes: Vec::new(),
        }
    } else if args.indexes_only {
        ProvisionReport {
            collections: Vec::new(),
            indexes: provision::create_indexes(conn)
                .await
                .context("Failed to create indexes")?,
        }
    } else {
        provision::run(conn)
            .await
            .with_context(|| format!("Failed to provision {}", conn.describe()))?
    };

    print_json(&report)
}
