//! Command implementations for the heartdb CLI

pub mod audit;
pub mod demo;
pub mod ecg;
pub mod patient;
pub mod provision;

// Re-export dispatcher functions for flat access from main.rs
pub use audit::run_audit;
pub use demo::run_demo;
pub use ecg::run_ecg;
pub use patient::run_patient;
pub use provision::run_provision;

use anyhow::{Context, Result};
use serde::Serialize;

/// Print `value` as pretty relaxed Extended JSON, so dates and ObjectIds come
/// out readable.
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let bson = bson::to_bson(value).context("Failed to encode output")?;
    let json = serde_json::to_string_pretty(&bson.into_relaxed_extjson())?;
    println!("{json}");
    Ok(())
}
