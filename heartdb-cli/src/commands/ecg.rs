//! ECG command - statistics and the latest test

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use heartdb_store::{ConnectionManager, EcgTestRepo};

use super::print_json;

#[derive(Parser, Debug)]
pub struct EcgArgs {
    #[command(subcommand)]
    pub command: EcgCommand,
}

#[derive(Subcommand, Debug)]
pub enum EcgCommand {
    /// Totals and averages across every ECG test
    Stats,
    /// The most recent ECG test (null when there are none)
    Latest,
}

pub async fn run_ecg(args: EcgArgs, conn: &ConnectionManager) -> Result<()> {
    let repo = EcgTestRepo::new(conn);

    match args.command {
        EcgCommand::Stats => {
            let stats = repo
                .statistics()
                .await
                .context("Failed to compute ECG statistics")?;
            print_json(&stats)
        }
        EcgCommand::Latest => {
            let latest = repo
                .find_latest()
                .await
                .context("Failed to load latest ECG test")?;
            print_json(&latest)
        }
    }
}
