//! Tests for the `fleetdata` binary: output on success and exit codes on
//! failure (2 for caller errors, 1 for everything else).

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A CLI invocation against a database inside `temp`, run from `temp` so
/// no stray `fleetdata.json` is picked up.
fn fleetdata(temp: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_fleetdata"));
    cmd.current_dir(temp.path())
        .arg("--database")
        .arg(temp.path().join("fleetdata.db"))
        .env_remove("RUST_LOG");
    cmd
}

fn create(temp: &TempDir, payload: &str) {
    fleetdata(temp)
        .args(["create", "-"])
        .write_stdin(payload)
        .assert()
        .success();
}

#[test]
fn test_create_and_update() {
    let temp = TempDir::new().unwrap();
    fleetdata(&temp)
        .args(["create", "-"])
        .write_stdin(r#"{"load_id": "L1", "dispatch_group": "G1"}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("Ready for job"));
    create(&temp, r#"{"load_id": "L2", "dispatch_group": "G1"}"#);

    fleetdata(&temp)
        .args(["update", "-"])
        .write_stdin(r#"{"load_id": "L1", "start_datetime": "2026-03-01T06:00:00Z"}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""mode": "group""#))
        .stdout(predicate::str::contains(r#""group_size": 2"#));

    fleetdata(&temp)
        .args(["show", "L2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Job started"));
}

#[test]
fn test_malformed_payloads_exit_with_client_error() {
    let temp = TempDir::new().unwrap();
    create(&temp, r#"{"load_id": "L1"}"#);

    let cases: &[(&str, &str)] = &[
        ("create", r#"{"load_id": "#),
        ("create", r#"{"load_id": "L2", "dispatch_grup": "G1"}"#),
        ("update", r#"{"load_id": "L1", "start_datetime": 7}"#),
        ("preview", "[1, 2"),
        ("pallets", r#"{"load_id": "L1", "drop_pallet": "many"}"#),
    ];
    for (command, payload) in cases {
        fleetdata(&temp)
            .args([*command, "-"])
            .write_stdin(*payload)
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Invalid payload"));
    }
}

#[test]
fn test_unknown_job_exits_with_client_error() {
    let temp = TempDir::new().unwrap();
    fleetdata(&temp)
        .args(["update", "-"])
        .write_stdin(r#"{"load_id": "ghost", "start_datetime": "2026-03-01T06:00:00Z"}"#)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Job not found: ghost"));
}

#[test]
fn test_unknown_log_level_override_rejected() {
    let temp = TempDir::new().unwrap();
    fleetdata(&temp)
        .args(["--log-level", "verbose", "show", "L1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown log level"));
}
