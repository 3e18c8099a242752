//! Integration tests for the `intesis` CLI binary.
//!
//! Validate argument parsing, help output, and credential-chain error
//! handling — all without touching the cloud.
#![allow(clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a command for the `intesis` binary with env isolation.
///
/// Clears all `INTESIS_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn intesis_cmd() -> Command {
    let mut cmd = Command::cargo_bin("intesis").unwrap();
    cmd.env("HOME", "/tmp/intesis-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/intesis-cli-test-nonexistent")
        .env_remove("INTESIS_USERNAME")
        .env_remove("INTESIS_PASSWORD")
        .env_remove("INTESIS_SECRETS")
        .env_remove("INTESIS_HOSTNAME");
    cmd
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn no_args_shows_help() {
    let output = intesis_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(text.contains("Usage"), "expected usage in output:\n{text}");
}

#[test]
fn help_lists_commands() {
    intesis_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("devices")
            .and(predicate::str::contains("status"))
            .and(predicate::str::contains("set"))
            .and(predicate::str::contains("watch")),
    );
}

#[test]
fn version_flag() {
    intesis_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("intesis"));
}

#[test]
fn unknown_subcommand_is_usage_error() {
    let output = intesis_cmd().arg("defrost").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn status_requires_numeric_device() {
    let output = intesis_cmd()
        .args(["status", "not-a-number"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Credential chain ────────────────────────────────────────────────

#[test]
fn missing_credentials_exits_auth_code() {
    let output = intesis_cmd().arg("devices").output().unwrap();
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("credentials"),
        "expected credentials hint in stderr:\n{stderr}"
    );
}

#[test]
fn secrets_flag_with_missing_file_exits_auth_code() {
    let output = intesis_cmd()
        .args(["--secrets", "/tmp/intesis-cli-test-nonexistent/creds.yaml"])
        .arg("devices")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn watch_rejects_malformed_interval() {
    let output = intesis_cmd()
        .args(["watch", "127934703953", "--interval", "soon"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}
