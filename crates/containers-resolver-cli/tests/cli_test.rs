#![allow(deprecated)] // TODO: move cargo_bin to the cargo_bin_cmd! macro

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Command with no config or environment leaking in from the host
fn resolver_cmd(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("containers-resolver").unwrap();
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env_remove("CONTAINERS_RESOLVER_CONFIG")
        .env_remove("CONTAINERS_RESOLVER_SCAN_PATH")
        .env_remove("CONTAINERS_RESOLVER_RESOLUTION_FOLDER")
        .env_remove("CONTAINERS_RESOLVER_IMAGES")
        .env_remove("CONTAINERS_RESOLVER_PLATFORM")
        .env_remove("CONTAINERS_RESOLVER_KEEP_RESULTS")
        .env_remove("CONTAINERS_RESOLVER_SYFT")
        .env_remove("CONTAINERS_RESOLVER_DEBUG");
    cmd
}

#[test]
fn test_cli_help() {
    let home = tempfile::tempdir().unwrap();
    resolver_cmd(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--scan-path"))
        .stdout(predicate::str::contains("--resolution-folder"))
        .stdout(predicate::str::contains("--image"))
        .stdout(predicate::str::contains("--keep-results"));
}

#[test]
fn test_cli_version() {
    let home = tempfile::tempdir().unwrap();
    resolver_cmd(&home)
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("containers-resolver"));
}

#[test]
fn test_cli_requires_paths() {
    let home = tempfile::tempdir().unwrap();
    resolver_cmd(&home)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--scan-path"));
}

#[test]
fn test_cli_rejects_missing_resolution_folder() {
    let home = tempfile::tempdir().unwrap();
    let scan = tempfile::tempdir().unwrap();
    let missing = home.path().join("missing");

    resolver_cmd(&home)
        .arg("--scan-path")
        .arg(scan.path())
        .arg("--resolution-folder")
        .arg(&missing)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Resolution failed"));

    assert!(!missing.exists());
}

#[test]
fn test_cli_reports_missing_scan_path() {
    let home = tempfile::tempdir().unwrap();
    let resolution = tempfile::tempdir().unwrap();

    resolver_cmd(&home)
        .arg("--scan-path")
        .arg(home.path().join("no-such-project"))
        .arg("--resolution-folder")
        .arg(resolution.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Scan path not found"));

    assert!(!resolution.path().join(".checkmarx/containers").exists());
}

#[test]
fn test_cli_keep_results_writes_resolution() {
    let home = tempfile::tempdir().unwrap();
    let scan = tempfile::tempdir().unwrap();
    let resolution = tempfile::tempdir().unwrap();

    // Nothing to analyze, so syft is never started
    resolver_cmd(&home)
        .arg("--scan-path")
        .arg(scan.path())
        .arg("--resolution-folder")
        .arg(resolution.path())
        .arg("--keep-results")
        .arg("--syft")
        .arg(home.path().join("no-syft"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Resolution completed"));

    let file = resolution
        .path()
        .join(".checkmarx/containers/containers-resolution.json");
    assert_eq!(fs::read_to_string(file).unwrap().trim(), "[]");
}

#[test]
fn test_cli_rejects_invalid_config() {
    let home = tempfile::tempdir().unwrap();
    let scan = tempfile::tempdir().unwrap();
    let resolution = tempfile::tempdir().unwrap();
    let config = home.path().join("config.yaml");
    fs::write(&config, "results_dir: ../outside\n").unwrap();

    resolver_cmd(&home)
        .arg("--scan-path")
        .arg(scan.path())
        .arg("--resolution-folder")
        .arg(resolution.path())
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("results_dir"));
}
