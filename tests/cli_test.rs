// file: tests/cli_test.rs
// version: 1.0.0
// guid: 1c7f5e92-a046-4d38-b5f1-98d20c6a47e3

//! Black-box tests of the secops-agent binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::TempDir;

fn write_config(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("config.yaml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
        file,
        "output_dir: {}\naudit_dir: {}",
        dir.path().join("outputs").display(),
        dir.path().join("audit").display()
    )
    .unwrap();
    path
}

#[test]
fn tools_reports_the_catalogue() {
    let mut cmd = Command::cargo_bin("secops-agent").unwrap();
    cmd.args(["tools", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nmap"))
        .stdout(predicate::str::contains("catalogued tools installed"));
}

#[test]
fn tools_json_output_is_parseable() {
    let mut cmd = Command::cargo_bin("secops-agent").unwrap();
    let output = cmd.args(["tools", "--json", "--quiet"]).output().unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> = report
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect();
    assert!(names.contains(&"nmap"));
    assert!(names.contains(&"metasploit"));
}

#[test]
fn check_target_flags_blocked_ranges() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    let mut cmd = Command::cargo_bin("secops-agent").unwrap();
    cmd.args([
        "check-target",
        "192.168.1.1",
        "--config",
        config.to_str().unwrap(),
        "--quiet",
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("blocked"));
}

#[test]
fn check_target_recognizes_practice_domains() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    let mut cmd = Command::cargo_bin("secops-agent").unwrap();
    cmd.args([
        "check-target",
        "demo.testfire.net",
        "--config",
        config.to_str().unwrap(),
        "--quiet",
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("authorized"));
}

#[test]
fn denied_query_exits_zero_with_refusal() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    // Blocked target: the refusal is a normal answer, not a process failure.
    let mut cmd = Command::cargo_bin("secops-agent").unwrap();
    cmd.args([
        "query",
        "-q",
        "scan 127.0.0.1 for open ports",
        "--config",
        config.to_str().unwrap(),
        "--quiet",
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("Authorization denied"));
}

#[test]
fn invalid_explicit_target_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    let mut cmd = Command::cargo_bin("secops-agent").unwrap();
    cmd.args([
        "query",
        "-q",
        "scan it for open ports",
        "--target",
        "not a target!!",
        "--config",
        config.to_str().unwrap(),
        "--quiet",
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Invalid target format"));
}
