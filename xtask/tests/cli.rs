#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

fn xtask() -> Command {
    let mut cmd = Command::cargo_bin("xtask").expect("xtask binary");
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_the_commands() {
    xtask().arg("--help").assert().success().stdout(
        predicate::str::contains("publish")
            .and(predicate::str::contains("check-code"))
            .and(predicate::str::contains("ci")),
    );
}

#[test]
fn tasks_are_listed_with_descriptions() {
    xtask().arg("tasks").assert().success().stdout(
        predicate::str::contains("build")
            .and(predicate::str::contains("check_code"))
            .and(predicate::str::contains("publish"))
            .and(predicate::str::contains("test")),
    );
}

#[test]
fn readme_only_push_is_skipped() {
    xtask()
        .args(["-q", "ci", "check", "--event", "push", "--ref", "refs/heads/main"])
        .args(["--changed", "README.md"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("skip (only ignored paths changed)"));
}

#[test]
fn source_change_runs_in_the_ref_group() {
    xtask()
        .args(["-q", "ci", "check", "--event", "pull-request", "--ref", "refs/pull/7/merge"])
        .args(["--changed", "README.md", "--changed", "src/ic_mple_log/src/lib.rs"])
        .assert()
        .success()
        .stdout(
            predicate::str::starts_with("run")
                .and(predicate::str::contains("concurrency group: CI-refs/pull/7/merge")),
        );
}

#[test]
fn settings_file_changes_the_triggers() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let config = tmp.path().join("xtask.toml");
    fs::write(&config, "[ci]\nbranches = [\"release/*\"]\n").expect("write settings");

    xtask()
        .arg("--config")
        .arg(&config)
        .args(["-q", "ci", "check", "--event", "push", "--ref", "refs/heads/main"])
        .args(["--changed", "Cargo.toml"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("skip (branch not watched)"));
}

#[test]
fn missing_settings_file_fails() {
    let tmp = tempfile::tempdir().expect("tempdir");

    xtask()
        .arg("--config")
        .arg(tmp.path().join("absent.toml"))
        .arg("tasks")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load xtask settings"));
}

#[test]
fn checked_in_workflow_is_current() {
    xtask()
        .args(["-q", "ci", "render", "--check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("is up to date"));
}

fn publish_settings(dir: &Path) -> PathBuf {
    let config = dir.join("xtask.toml");
    fs::write(&config, "[publish]\ntargets = [\"src/no_such_package\"]\ndelay_secs = 0\n")
        .expect("write settings");
    config
}

#[test]
fn publish_fails_after_reporting_a_failed_target() {
    let tmp = tempfile::tempdir().expect("tempdir");

    xtask()
        .arg("--config")
        .arg(publish_settings(tmp.path()))
        .args(["-q", "publish", "--json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"status\": \"failed\""))
        .stderr(predicate::str::contains("1 of 1 targets failed"));
}

#[test]
fn no_fail_keeps_the_exit_status_clean() {
    let tmp = tempfile::tempdir().expect("tempdir");

    xtask()
        .arg("--config")
        .arg(publish_settings(tmp.path()))
        .args(["-q", "publish", "--json", "--no-fail"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"failed\""));
}
