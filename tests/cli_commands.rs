use assert_cmd::prelude::*;
use serde_json::Value;
use std::path::Path;
use std::process::Command;

fn tracker(config_dir: &Path) -> Command {
    let bin = assert_cmd::cargo::cargo_bin!("tracker");
    let mut cmd = Command::new(bin);
    cmd.arg("--config")
        .arg(config_dir.join("config.yaml"))
        .env_remove("TRACKER_WIRING_PATH")
        .env_remove("TRACKER_POLICY_PATH")
        .env_remove("TRACKER_POLICY_OVERRIDE_JSON")
        .env_remove("TRACKER_POLICY_CLI_OVERRIDES");
    cmd
}

fn stdout_json(cmd: &mut Command) -> Value {
    let assert = cmd.assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 output");
    serde_json::from_str(&stdout).expect("valid json")
}

#[test]
fn requirements_lists_all_twelve() {
    let dir = tempfile::tempdir().unwrap();
    let value = stdout_json(tracker(dir.path()).args(["--output", "json", "requirements"]));
    let rows = value.as_array().unwrap();
    assert_eq!(rows.len(), 12);
    assert!(rows
        .iter()
        .any(|row| row["name"] == "UpdateComment" && row["kind"] == "Comment"));
}

#[test]
fn check_reports_handler_verdicts() {
    let dir = tempfile::tempdir().unwrap();

    let assert = tracker(dir.path())
        .args(["check", "--kind", "ticket", "--operation", "read"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert_eq!(stdout.trim(), "ReadTicket: Succeeded");

    let value = stdout_json(tracker(dir.path()).args([
        "--output",
        "json",
        "check",
        "--kind",
        "project",
        "--operation",
        "edit",
        "--user",
        "bob",
        "--role",
        "user",
        "--owner",
        "bob",
    ]));
    assert_eq!(value["requirement"], "UpdateProject");
    assert_eq!(value["succeeded"], false);

    let value = stdout_json(tracker(dir.path()).args([
        "--output",
        "json",
        "check",
        "--kind",
        "comment",
        "--operation",
        "read",
        "--user",
        "root",
        "--role",
        "admin",
        "--owner",
        "bob",
    ]));
    assert_eq!(value["succeeded"], true);
}

#[test]
fn check_rejects_unknown_operation() {
    let dir = tempfile::tempdir().unwrap();
    tracker(dir.path())
        .args(["check", "--kind", "ticket", "--operation", "archive"])
        .assert()
        .failure();
}

#[test]
fn wiring_file_replaces_builtin_handlers() {
    let dir = tempfile::tempdir().unwrap();
    let wiring = dir.path().join("wiring.yaml");
    std::fs::write(
        &wiring,
        "version: 1\nkinds:\n  - kind: ticket\n    handlers: [admin]\n",
    )
    .unwrap();

    let assert = tracker(dir.path())
        .env("TRACKER_WIRING_PATH", &wiring)
        .args(["check", "--kind", "ticket", "--operation", "read"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert_eq!(stdout.trim(), "ReadTicket: Failed");
}

#[test]
fn demo_runs_the_full_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let snapshots = dir.path().join("snapshots");
    let value = stdout_json(
        tracker(dir.path())
            .args(["--output", "json", "demo", "--snapshot-dir"])
            .arg(&snapshots),
    );

    let steps = value.as_array().unwrap();
    assert!(!steps.is_empty());
    assert!(steps.iter().all(|step| step["expected"] == step["status"]));
    assert!(snapshots.join("projects.json").exists());
    assert!(snapshots.join("comments.json").exists());
}

#[test]
fn policy_reports_overrides_with_provenance() {
    let dir = tempfile::tempdir().unwrap();
    let value = stdout_json(
        tracker(dir.path())
            .env("TRACKER_POLICY__COMMENTS__WRITE_REQUIREMENT", "legacy")
            .args(["--output", "json", "policy"]),
    );
    assert_eq!(value["comments"]["write_requirement"], "legacy");
}
