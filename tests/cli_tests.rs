//! Integration tests for CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const SSM_VARS: &[&str] = &[
    "SSM_PATHS",
    "SSM_TAGS",
    "SSM_REGION",
    "SSM_MAX_RETRIES",
    "SSM_MAX_BACKOFF_MS",
    "SSM_TIMEOUT",
];

/// The binary run from an empty directory with no `SSM_*` variables set.
fn ssm_env(dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("ssm-env"));
    cmd.current_dir(dir.path());
    for var in SSM_VARS {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_cli_version() {
    let dir = TempDir::new().expect("tmp");
    ssm_env(&dir).arg("--version").assert().success().stdout(predicate::str::contains("ssm-env"));
}

#[test]
fn test_cli_help() {
    let dir = TempDir::new().expect("tmp");
    ssm_env(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Load AWS SSM Parameter Store"))
        .stdout(predicate::str::contains("--paths"))
        .stdout(predicate::str::contains("--tags"))
        .stdout(predicate::str::contains("SSM_REGION"));
}

#[test]
fn test_requires_paths_or_tags() {
    let dir = TempDir::new().expect("tmp");
    ssm_env(&dir)
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("At least one of --paths or --tags must be specified"));
}

#[test]
fn test_rejects_flat_path_flag() {
    let dir = TempDir::new().expect("tmp");
    ssm_env(&dir)
        .args(["--paths", "/prod/app/,prod"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Invalid path: 'prod'"));
}

#[test]
fn test_rejects_flat_path_from_env() {
    let dir = TempDir::new().expect("tmp");
    ssm_env(&dir)
        .env("SSM_PATHS", "webapp")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid path: 'webapp'"));
}

#[test]
fn test_rejects_flat_path_from_paths_file() {
    let dir = TempDir::new().expect("tmp");
    fs::write(dir.path().join("ssm_paths.txt"), "# shared\n/prod/shared/\nstaging\n")
        .expect("write paths file");

    ssm_env(&dir).assert().code(1).stderr(predicate::str::contains("Invalid path: 'staging'"));
}

#[test]
fn test_rejects_flat_path_from_config_file() {
    let dir = TempDir::new().expect("tmp");
    fs::write(dir.path().join("ssm-env.toml"), "paths = ['prod']\n").expect("write config");

    ssm_env(&dir).assert().code(1).stderr(predicate::str::contains("Invalid path: 'prod'"));
}

#[test]
fn test_missing_explicit_config_is_rejected() {
    let dir = TempDir::new().expect("tmp");
    ssm_env(&dir)
        .args(["--paths", "/prod/app/", "--config", "missing.toml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed reading config file"));
}

#[test]
fn test_missing_explicit_paths_file_is_rejected() {
    let dir = TempDir::new().expect("tmp");
    ssm_env(&dir)
        .args(["--paths-file", "nope.txt"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed reading paths file"));
}

#[test]
fn test_rejects_unknown_format() {
    let dir = TempDir::new().expect("tmp");
    ssm_env(&dir)
        .args(["--paths", "/prod/app/", "--format", "yaml"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid value 'yaml'"));
}

#[test]
fn test_rejects_empty_tag() {
    let dir = TempDir::new().expect("tmp");
    ssm_env(&dir)
        .args(["--tags", "tag:"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("tag keys must not be empty"));
}
