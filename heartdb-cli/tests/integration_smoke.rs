//! Smoke tests to verify command wiring
//!
//! Everything here runs against `--memory`, so no database is needed.

use assert_cmd::Command;
use predicates::prelude::*;

fn heartdb() -> Command {
    let mut cmd = Command::cargo_bin("heartdb").unwrap();
    // Keep a developer's own settings out of the run.
    cmd.env_remove("RUST_LOG")
        .env_remove("MONGODB_URI")
        .env_remove("HEARTDB_DATABASE")
        .env_remove("HEARTDB_LOG");
    cmd
}

// === Help Tests ===

#[test]
fn test_top_level_help() {
    heartdb()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("provision"))
        .stdout(predicate::str::contains("--memory"));
}

#[test]
fn test_provision_help() {
    heartdb()
        .args(["provision", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Only create the indexes"));
}

#[test]
fn test_patient_list_help() {
    heartdb()
        .args(["patient", "list", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Patients per page"));
}

#[test]
fn test_provision_flags_conflict() {
    heartdb()
        .args(["--memory", "provision", "--collections-only", "--indexes-only"])
        .assert()
        .failure();
}

// === In-memory Runs ===

#[test]
fn test_demo_prints_patient() {
    heartdb()
        .args(["--memory", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"patient_id\": \"PAT_"))
        .stdout(predicate::str::contains("\"first_name\": \"John\""));
}

#[test]
fn test_provision_reports_indexes() {
    heartdb()
        .args(["--memory", "provision"])
        .assert()
        .success()
        .stdout(predicate::str::contains("patients.patient_id_1"))
        .stdout(predicate::str::contains("audit_logs.logged_at_-1"));
}

#[test]
fn test_empty_ecg_stats() {
    heartdb()
        .args(["--memory", "ecg", "stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"totalTests\": 0"))
        .stdout(predicate::str::contains("\"heartDiseaseCases\": 0"));
}

#[test]
fn test_missing_patient_fails() {
    heartdb()
        .args(["--memory", "patient", "get", "PAT_missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Patient not found"));
}

#[test]
fn test_completions_bash() {
    heartdb()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("heartdb"));
}

// === Configuration ===

#[test]
fn test_broken_config_file_is_reported() {
    let home = tempfile::tempdir().unwrap();
    let config_dir = home.path().join(".heartdb");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), "[database\nuri = ").unwrap();

    heartdb()
        .env("HOME", home.path())
        .args(["--memory", "ecg", "stats"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn test_config_loading_is_logged() {
    let home = tempfile::tempdir().unwrap();
    let config_dir = home.path().join(".heartdb");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), "[logging]\nlevel = \"info\"\n").unwrap();

    heartdb()
        .env("HOME", home.path())
        .current_dir(home.path())
        .args(["--memory", "ecg", "stats"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Loading config from"));
}

#[test]
fn test_debug_flag_covers_dotenv_lookup() {
    let home = tempfile::tempdir().unwrap();

    heartdb()
        .env("HOME", home.path())
        .current_dir(home.path())
        .args(["--debug", "--memory", "ecg", "stats"])
        .assert()
        .success()
        .stderr(predicate::str::contains("No .env files found"));
}

#[test]
fn test_configured_level_quiets_info() {
    let home = tempfile::tempdir().unwrap();
    let config_dir = home.path().join(".heartdb");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), "[logging]\nlevel = \"warn\"\n").unwrap();

    heartdb()
        .env("HOME", home.path())
        .current_dir(home.path())
        .args(["--memory", "demo"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Created patient").not());
}
