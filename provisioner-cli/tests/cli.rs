use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

const TEAM_A: &str = r#"{
  "organizations": [{ "name": "Team A" }],
  "dataSources": [{ "uid": "ds-1", "name": "Loki", "type": "loki", "url": "http://loki:3100" }],
  "folders": [{ "uid": "fld-1", "title": "Services" }],
  "dashboards": [{ "dashboard": { "uid": "home", "title": "Home" }, "folderUid": "fld-1" }]
}"#;

fn provisioner_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("grafana-provisioner"));
    cmd.current_dir(dir)
        .env("NO_COLOR", "1")
        .env("CLICOLOR", "0")
        .env("OTEL_SDK_DISABLED", "true")
        .env("RUST_LOG", "off")
        // Nothing listens on port 1: every request fails at the transport level.
        .env("GRAFANA_URL", "127.0.0.1:1");
    cmd
}

fn write_config(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.json");
    std::fs::write(&path, contents).expect("write config");
    path
}

#[test]
fn validate_prints_item_counts() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, TEAM_A);

    provisioner_cmd(dir.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(contains("is valid"))
        .stdout(contains("organizations"))
        .stdout(contains("dashboards"));
}

#[test]
fn validate_accepts_explicit_config_path() {
    let dir = TempDir::new().unwrap();
    let elsewhere = TempDir::new().unwrap();
    let path = write_config(&elsewhere, TEAM_A);

    provisioner_cmd(dir.path())
        .args(["validate", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(contains("is valid"));
}

#[test]
fn missing_config_fails() {
    let dir = TempDir::new().unwrap();

    provisioner_cmd(dir.path())
        .arg("validate")
        .assert()
        .failure()
        .stderr(contains("config not found"));
}

#[test]
fn invalid_json_fails_with_path() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "{ \"organizations\": [ ");

    provisioner_cmd(dir.path())
        .arg("validate")
        .assert()
        .failure()
        .stderr(contains("failed to parse config").and(contains("config.json")));
}

#[test]
fn provision_reports_per_resource_failures_and_exits_zero() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, TEAM_A);

    provisioner_cmd(dir.path())
        .args(["provision", "--no-telemetry"])
        .assert()
        .success()
        .stdout(contains("'Team A'"))
        .stdout(contains("0 created, 0 updated, 1 failed"));
}

#[test]
fn provision_json_report() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, TEAM_A);

    let output = provisioner_cmd(dir.path())
        .args(["provision", "--no-telemetry", "--json"])
        .output()
        .expect("run provision");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json report");
    let resources = &report["organizations"][0]["resources"];
    assert_eq!(resources[0]["kind"], "organization");
    assert_eq!(resources[0]["outcome"], "failed");
    assert_eq!(resources[1]["outcome"], "skipped");
    assert_eq!(report["interrupted"], false);
}

#[test]
fn provision_with_no_organizations_does_nothing() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "{}");

    provisioner_cmd(dir.path())
        .args(["provision", "--dry-run"])
        .assert()
        .success()
        .stdout(contains("nothing to do"));
}
