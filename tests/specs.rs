// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

//! CLI-level smoke tests for the `substrate` binary contract.
//! Storage-engine scenarios (S1-S6) live in `crates/storage/tests`, closer
//! to the code they exercise; this file only checks the external surface.

use assert_cmd::Command;
use tempfile::tempdir;

fn substrate_cmd(home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("substrate").expect("substrate binary");
    cmd.env("AGENTOS_HOME", home);
    cmd
}

#[test]
fn project_add_then_list_round_trips() {
    let home = tempdir().expect("tempdir");
    substrate_cmd(home.path())
        .args(["project", "add", "/repo/demo"])
        .assert()
        .success()
        .stdout(predicates::str::contains("created"));

    substrate_cmd(home.path())
        .args(["project", "list"])
        .assert()
        .success()
        .stdout(predicates::str::contains("demo"));
}

#[test]
fn migrate_check_reports_not_ready_until_to_multi_repo_runs() {
    let home = tempdir().expect("tempdir");
    let add = substrate_cmd(home.path()).args(["project", "add", "/repo/demo"]).assert().success();
    let stdout = String::from_utf8_lossy(&add.get_output().stdout).to_string();
    let project_id = stdout.split_whitespace().last().expect("project id in output").to_string();

    substrate_cmd(home.path())
        .args(["project", "migrate", "check", &project_id])
        .assert()
        .success()
        .stdout(predicates::str::contains("needs migration"));

    substrate_cmd(home.path())
        .args(["project", "migrate", "to-multi-repo", &project_id])
        .assert()
        .success()
        .stdout(predicates::str::contains("created repo root"));

    substrate_cmd(home.path())
        .args(["project", "migrate", "check", &project_id])
        .assert()
        .success()
        .stdout(predicates::str::contains("ready for multi-repo"));

    substrate_cmd(home.path())
        .args(["project", "migrate", "list-repos", &project_id])
        .assert()
        .success()
        .stdout(predicates::str::contains("root"));
}

#[test]
fn unknown_project_trace_fails_with_nonzero_exit() {
    let home = tempdir().expect("tempdir");
    substrate_cmd(home.path()).args(["project", "trace", "prj-does-not-exist"]).assert().failure();
}
