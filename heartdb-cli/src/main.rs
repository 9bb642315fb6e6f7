//! heartdb CLI - provisioning and record access for the heartdb clinical store
//!
//! Subcommands:
//! - `provision` creates the collections and indexes (run once per deployment)
//! - `demo` writes the sample patient
//! - `patient`, `ecg` and `audit` read and manage stored records
//!
//! Every command prints pretty JSON on stdout. `--memory` swaps MongoDB for a
//! throwaway in-memory store.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use heartdb_core::config::load_dotenv;
use heartdb_core::HeartConfig;
use heartdb_store::ConnectionManager;
use tracing::{debug, warn};

mod commands;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "heartdb",
    author,
    version,
    about = "Data access for the heart disease clinical store (patients, encounters, ECG tests, audit logs)",
    long_about = "Provision and query the heart disease MongoDB store. Connection settings come from \
                  flags, MONGODB_URI / HEARTDB_DATABASE, ~/.heartdb/config.toml, then defaults."
)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// MongoDB connection string (overrides MONGODB_URI and config.toml)
    #[arg(long, global = true)]
    uri: Option<String>,

    /// Database name (overrides HEARTDB_DATABASE and config.toml)
    #[arg(long, global = true)]
    database: Option<String>,

    /// Use an empty in-memory store instead of MongoDB
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create collections and indexes
    Provision(commands::provision::ProvisionArgs),
    /// Create the sample patient (John Doe) and print it
    Demo,
    /// Look up, list or delete patients
    Patient(commands::patient::PatientArgs),
    /// ECG test statistics and latest reading
    Ecg(commands::ecg::EcgArgs),
    /// Read the audit trail
    Audit(commands::audit::AuditArgs),
    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    shell: Shell,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)] // PowerShell is a proper noun, not a suffix
enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Completions(args) = &cli.command {
        return run_completions(args);
    }

    let mut tracing_config = tracing_setup::TracingConfig {
        debug: cli.debug,
        level: None,
    };
    let tracing = match tracing_setup::init(&tracing_config) {
        Ok(handle) => Some(handle),
        Err(err) => {
            eprintln!("warning: logging disabled: {err:#}");
            None
        }
    };

    load_dotenv();
    let mut config = HeartConfig::load().context("Failed to load configuration")?;
    if let Some(uri) = cli.uri.clone() {
        config.database.uri = uri;
    }
    if let Some(name) = cli.database.clone() {
        config.database.name = name;
    }
    config.validate().context("Invalid configuration")?;

    tracing_config.level = config.logging.level.clone();
    if let Some(tracing) = &tracing {
        if let Err(err) = tracing.apply(&tracing_config) {
            warn!("{err:#}");
        }
    }

    let conn = if cli.memory {
        ConnectionManager::in_memory()
    } else {
        ConnectionManager::new(config.database.clone())
    };
    debug!(target = %conn.describe(), "Store selected");

    let result = run_command(cli.command, &conn).await;
    conn.close().await;
    result
}

async fn run_command(command: Commands, conn: &ConnectionManager) -> Result<()> {
    match command {
        Commands::Provision(args) => commands::run_provision(args, conn).await,
        Commands::Demo => commands::run_demo(conn).await,
        Commands::Patient(args) => commands::run_patient(args, conn).await,
        Commands::Ecg(args) => commands::run_ecg(args, conn).await,
        Commands::Audit(args) => commands::run_audit(args, conn).await,
        Commands::Completions(args) => run_completions(&args),
    }
}

fn run_completions(args: &CompletionsArgs) -> Result<()> {
    use clap::CommandFactory;
    use clap_complete::{generate, Shell as CompletionShell};
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();

    let shell = match args.shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    };

    generate(shell, &mut cmd, bin_name, &mut io::stdout());

    Ok(())
}
