// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

use super::*;
use tempfile::tempdir;

fn temp_db() -> (tempfile::TempDir, Database) {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("db.sqlite");
    let db = Database::open_at(&path).expect("open db");
    (dir, db)
}

#[test]
fn fresh_database_lands_on_latest_version() {
    let (_dir, db) = temp_db();
    let version = current_version(&db).expect("current version");
    assert_eq!(version, MIGRATIONS.last().expect("at least one migration").0);
}

#[test]
fn reopening_is_idempotent() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("db.sqlite");
    let db1 = Database::open_at(&path).expect("open db first time");
    let v1 = current_version(&db1).expect("version after first open");
    drop(db1);
    let db2 = Database::open_at(&path).expect("open db second time");
    let v2 = current_version(&db2).expect("version after second open");
    assert_eq!(v1, v2);
}

#[test]
fn legacy_repo_scope_backfill_covers_default_repo_tasks() {
    let (_dir, db) = temp_db();
    db.write(|conn| {
        conn.execute(
            "INSERT INTO projects (project_id, name, status, default_repo_id, created_at, updated_at)
             VALUES ('p1', 'legacy', 'active', 'r1', 0, 0)",
            [])?;
        conn.execute(
            "INSERT INTO repos (repo_id, project_id, name, default_branch, workspace_relpath, role, is_writable)
             VALUES ('r1', 'p1', 'root', 'main', '.', 'code', 1)",
            [])?;
        conn.execute(
            "INSERT INTO tasks (task_id, title, status, project_id, created_at, updated_at)
             VALUES ('t1', 'legacy task', 'queued', 'p1', 0, 0)",
            [])?;
        Ok(())
    })
    .expect("seed legacy task with no scope row");

    let stats = db.write(|conn| crate::migrations::backfill_legacy_repo_scope(conn)).expect("run backfill");
    assert_eq!(stats["rows_backfilled"], 1);
    assert_eq!(stats["verified"], true);

    let scope_count: i64 = db
        .read(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM task_repo_scope WHERE task_id = 't1' AND repo_id = 'r1'", [], |row| {
                row.get(0)
            })?)
        })
        .expect("count scope rows");
    assert_eq!(scope_count, 1);

    // Re-running is a no-op: no legacy task is left unscoped.
    let rerun = db.write(|conn| crate::migrations::backfill_legacy_repo_scope(conn)).expect("rerun backfill");
    assert_eq!(rerun["rows_backfilled"], 0);
}

#[test]
fn required_tables_exist_after_migration() {
    let (_dir, db) = temp_db();
    db.read(|conn| {
        for table in crate::schema::REQUIRED_TABLES {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                [table],
                |row| row.get(0))?;
            assert_eq!(count, 1, "missing table {table}");
        }
        Ok(())
    })
    .expect("read");
}
