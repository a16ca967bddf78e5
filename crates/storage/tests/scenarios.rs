// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

//! End-to-end scenarios S1-S6, each against a fresh database.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use rusqlite::params;
use substrate_core::{
    EvidenceExpected, EvidenceItem, EvidencePack, ExitReason, HealthMode, PassPolicy, RepoRole, SubstrateError,
    TaskStatus, TimelineSource,
};
use substrate_storage::*;
use tempfile::tempdir;

fn seed_task(db: &Database, task_id: &str, project_id: &str, now: i64) {
    db.write({
        let task_id = task_id.to_string();
        let project_id = project_id.to_string();
        move |conn| {
            Ok(conn.execute(
                "INSERT INTO tasks (task_id, title, status, project_id, created_at, updated_at)
                 VALUES (?1, 'T', 'queued', ?2, ?3, ?3)",
                params![task_id, project_id, now])?)
        }
    })
    .expect("seed task");
}

fn seed_run(db: &Database, task_id: &str, now: i64) {
    db.write({
        let task_id = task_id.to_string();
        move |conn| {
            Ok(conn.execute(
                "INSERT INTO task_runs (task_id, status, started_at) VALUES (?1, 'queued', ?2)",
                params![task_id, now])?)
        }
    })
    .expect("seed run");
}

fn seed_scope(db: &Database, task_id: &str, repo_id: &str, scope: &str, path_filters: &str) {
    db.write({
        let task_id = task_id.to_string();
        let repo_id = repo_id.to_string();
        let scope = scope.to_string();
        let path_filters = path_filters.to_string();
        move |conn| {
            Ok(conn.execute(
                "INSERT INTO task_repo_scope (task_id, repo_id, scope, path_filters) VALUES (?1, ?2, ?3, ?4)",
                params![task_id, repo_id, scope, path_filters])?)
        }
    })
    .expect("seed scope");
}

#[test]
fn s1_task_happy_path() {
    let dir = tempdir().expect("tempdir");
    let workspace = tempdir().expect("workspace");
    let db = Database::open_at(&dir.path().join("db.sqlite")).expect("open db");

    let project = add_project(&db, "P1", None, 0).expect("add project");
    let repo = add_repo(&db, project.project_id.as_str(), "be", &PathBuf::from("be"), RepoRole::Code, true, "main")
        .expect("add repo");
    fs::create_dir_all(workspace.path().join("be/src")).expect("mkdir");

    seed_task(&db, "T1", project.project_id.as_str(), 0);
    seed_run(&db, "T1", 0);
    seed_scope(&db, "T1", repo.repo_id.as_str(), "full", "[]");

    let env = build_environment(&db, "T1", workspace.path()).expect("build env");
    let be_ctx = env.get(&repo.repo_id).expect("be repo in env");
    be_ctx.validate_write(&PathBuf::from("be/src/a.txt")).expect("validate_write be/src/a.txt");

    let token = acquire_task(&db, "T1", "w-1", 60, 100).expect("acquire task lease");
    assert!(token.expires_at >= 100 + 60);

    fs::write(workspace.path().join("be/src/a.txt"), b"hello").expect("write artifact");

    let mut metadata = HashMap::new();
    metadata.insert("iter".to_string(), serde_json::json!(1));
    let step_id = begin_step(&db, "T1", "iteration_start", metadata, None, None, 101).expect("begin_step");
    let pack = EvidencePack::new(
        vec![EvidenceItem::pending(EvidenceExpected::ArtifactExists {
            path: "be/src/a.txt".to_string(),
            kind: None,
        })],
        PassPolicy::RequireAll);
    let checkpoint = commit_step(&db, &step_id, pack, None, workspace.path(), true, 102).expect("commit_step");
    assert_eq!(checkpoint.sequence_number, 1);
    assert!(checkpoint.verified);

    transition(&db, "T1", TaskStatus::Running, "w-1", None, None, &HashMap::new(), 103).expect("queued -> running");
    transition(
        &db,
        "T1",
        TaskStatus::Succeeded,
        "w-1",
        Some(ExitReason::Success),
        None,
        &HashMap::new(),
        104)
    .expect("running -> succeeded");

    let replayed = replay(&db, "T1").expect("replay");
    let has_running_transition = replayed
        .timeline
        .iter()
        .any(|e| e.source == TimelineSource::Transition && e.summary.contains("queued") && e.summary.contains("running"));
    assert!(has_running_transition, "timeline: {:?}", replayed.timeline);
    assert!(replayed.timeline.iter().any(|e| e.summary.contains("checkpoint_begin")));
    assert!(replayed.timeline.iter().any(|e| e.summary.contains("checkpoint_commit")));
    assert!(replayed
        .timeline
        .iter()
        .any(|e| e.source == TimelineSource::Transition && e.summary.contains("succeeded")));
}

#[test]
fn s2_file_lock_conflict() {
    let dir = tempdir().expect("tempdir");
    let db = Database::open_at(&dir.path().join("db.sqlite")).expect("open db");

    let project = add_project(&db, "P1", None, 0).expect("add project");
    seed_task(&db, "T1", project.project_id.as_str(), 0);
    seed_task(&db, "T2", project.project_id.as_str(), 0);
    seed_run(&db, "T1", 0);
    seed_run(&db, "T2", 0);

    acquire_paths(&db, "T1", "runA", &["be/x".to_string()], 10, "be", 0).expect("A acquires be/x");

    let result = acquire_paths(&db, "T2", "runB", &["be/x".to_string(), "be/y".to_string()], 10, "be", 1);
    assert!(matches!(result, Err(SubstrateError::LockConflict { .. })));

    let y_row: i64 = db
        .read(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM file_locks WHERE file_path = 'be/y'", [], |row| row.get(0))?))
        .expect("count be/y rows");
    assert_eq!(y_row, 0, "be/y must not be created when be/x conflicts");
}

#[test]
fn s3_path_scope_denial() {
    let dir = tempdir().expect("tempdir");
    let workspace = tempdir().expect("workspace");
    let db = Database::open_at(&dir.path().join("db.sqlite")).expect("open db");

    let project = add_project(&db, "P1", None, 0).expect("add project");
    let repo = add_repo(&db, project.project_id.as_str(), "be", &PathBuf::from("be"), RepoRole::Code, true, "main")
        .expect("add repo");
    fs::create_dir_all(workspace.path().join("be/src")).expect("mkdir src");
    fs::write(workspace.path().join("be/src/m.go"), b"package main").expect("write m.go");
    fs::write(workspace.path().join("be/README.md"), b"# readme").expect("write README");

    seed_task(&db, "T1", project.project_id.as_str(), 0);
    seed_scope(&db, "T1", repo.repo_id.as_str(), "paths", r#"["src/**"]"#);

    let env = build_environment(&db, "T1", workspace.path()).expect("build env");
    let be_ctx = env.get(&repo.repo_id).expect("be in env");

    be_ctx.validate_read(&PathBuf::from("be/src/m.go")).expect("src/** allows src/m.go");
    let denied = be_ctx.validate_read(&PathBuf::from("be/README.md"));
    assert!(matches!(denied, Err(SubstrateError::PathSecurity { .. })));
    be_ctx.validate_write(&PathBuf::from("be/src/m.go")).expect("writable repo allows write under scope");
}

#[test]
fn s4_traversal_denial() {
    let dir = tempdir().expect("tempdir");
    let workspace = tempdir().expect("workspace");
    let db = Database::open_at(&dir.path().join("db.sqlite")).expect("open db");

    let project = add_project(&db, "P1", None, 0).expect("add project");
    let repo = add_repo(&db, project.project_id.as_str(), "be", &PathBuf::from("be"), RepoRole::Code, true, "main")
        .expect("add repo");
    fs::create_dir_all(workspace.path().join("be")).expect("mkdir be");
    fs::create_dir_all(workspace.path().join("other")).expect("mkdir other");
    fs::write(workspace.path().join("other/secret"), b"shh").expect("write secret");

    seed_task(&db, "T1", project.project_id.as_str(), 0);
    seed_scope(&db, "T1", repo.repo_id.as_str(), "full", "[]");

    let env = build_environment(&db, "T1", workspace.path()).expect("build env");
    let be_ctx = env.get(&repo.repo_id).expect("be in env");

    let denied = be_ctx.validate_read(&PathBuf::from("be/../other/secret"));
    assert!(matches!(denied, Err(SubstrateError::PathSecurity { .. })));
}

#[test]
fn s5_checkpoint_rollback() {
    let dir = tempdir().expect("tempdir");
    let workspace = tempdir().expect("workspace");
    let db = Database::open_at(&dir.path().join("db.sqlite")).expect("open db");
    let project = add_project(&db, "P1", None, 0).expect("add project");
    seed_task(&db, "T1", project.project_id.as_str(), 0);

    fs::write(workspace.path().join("a.txt"), b"one").expect("write a");
    fs::write(workspace.path().join("b.txt"), b"two").expect("write b");

    let step1 = begin_step(&db, "T1", "plan", HashMap::new(), None, None, 0).expect("begin 1");
    let cp1 = commit_step(
        &db,
        &step1,
        EvidencePack::new(
            vec![EvidenceItem::pending(EvidenceExpected::ArtifactExists { path: "a.txt".to_string(), kind: None })],
            PassPolicy::RequireAll),
        None,
        workspace.path(),
        true,
        1)
    .expect("commit 1");
    assert_eq!(cp1.sequence_number, 1);

    let step2 = begin_step(&db, "T1", "plan", HashMap::new(), None, None, 2).expect("begin 2");
    let cp2 = commit_step(
        &db,
        &step2,
        EvidencePack::new(
            vec![EvidenceItem::pending(EvidenceExpected::ArtifactExists { path: "b.txt".to_string(), kind: None })],
            PassPolicy::RequireAll),
        None,
        workspace.path(),
        true,
        3)
    .expect("commit 2");
    assert_eq!(cp2.sequence_number, 2);

    fs::remove_file(workspace.path().join("a.txt")).expect("remove a");

    let rollback1 = rollback_to_checkpoint(&db, cp1.checkpoint_id.as_str(), workspace.path(), 10);
    assert!(matches!(rollback1, Err(SubstrateError::Checkpoint(_))));

    let rollback2 = rollback_to_checkpoint(&db, cp2.checkpoint_id.as_str(), workspace.path(), 11).expect("rollback 2");
    assert_eq!(rollback2, cp2.snapshot_data);
}

#[test]
fn s6_health_gate() {
    let dir = tempdir().expect("tempdir");
    let db_path = dir.path().join("db.sqlite");
    let db = Database::open_at(&db_path).expect("open db");

    // Force the journal mode to `delete`, simulating a database that never
    // got WAL configured (or was reopened by something that reset it).
    db.write(|conn| {
        conn.pragma_update(None, "journal_mode", "DELETE")?;
        Ok(())
    })
    .expect("force journal_mode=delete");

    let strict_report = health_check(&db, HealthMode::Strict);
    assert!(strict_report.should_abort());
    assert!(strict_report.failed().any(|c| c.name == "wal_mode"));

    let safe_report = health_check(&db, HealthMode::Safe);
    assert!(!safe_report.should_abort());
    assert!(safe_report.should_degrade());
    assert!(safe_report.failed().any(|c| c.name == "wal_mode"));
}
