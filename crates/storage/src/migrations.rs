// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

//! Migration Runner.

use rusqlite::Connection;
use substrate_core::{SubstrateError, SubstrateResult};

use crate::db::Database;
use crate::schema::{BackfillFn, MIGRATIONS};

fn checksum(sql: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(sql.as_bytes());
    hex::encode(digest)
}

/// Apply every migration in [`MIGRATIONS`] whose version is not already
/// recorded in `schema_version`. The `schema_version` table itself is
/// created by migration 1; earlier than that we probe for its existence
/// directly so a brand-new file bootstraps cleanly.
pub fn run_migrations(db: &Database) -> SubstrateResult<()> {
    for &(version, description, sql, backfill) in MIGRATIONS {
        let sql = sql.to_string();
        let description = description.to_string();
        let sum = checksum(&sql);
        db.write(move |conn| apply_if_missing(conn, version, &description, &sql, &sum, backfill))?;
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn apply_if_missing(
    conn: &Connection,
    version: i64,
    description: &str,
    sql: &str,
    checksum: &str,
    backfill: Option<BackfillFn>) -> SubstrateResult<()> {
    if schema_version_table_exists(conn)? {
        let already: Option<i64> = conn
            .query_row("SELECT version FROM schema_version WHERE version = ?1", [version], |row| {
                row.get(0)
            })
            .ok();
        if already.is_some() {
            return Ok(());
        }
    }
    conn.execute_batch(sql)?;
    // Data backfills run after the DDL but still inside the write closure's
    // transaction, so a failed verification rolls back the whole migration
    // rather than leaving a half-backfilled database recorded as applied.
    let metadata = match backfill {
        Some(f) => serde_json::to_string(&f(conn)?)?,
        None => "{}".to_string(),
    };
    // Migration 1 creates schema_version itself as part of `sql`; every
    // migration, including the first, records its own row here.
    let now = now_unix();
    conn.execute(
        "INSERT INTO schema_version (version, applied_at, description, checksum, metadata) VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![version, now, description, checksum, metadata])?;
    Ok(())
}

/// Give every task under a project whose `default_repo_id` is set, but that
/// has no `task_repo_scope` row of its own, full access to that default
/// repo. These are tasks that predate multi-repo scoping; without this they
/// would be silently unrunnable once the enforcer requires a scope row.
/// Verifies no such task is left unscoped before returning, and fails the
/// whole migration (rolling back the backfill with it) if any remain.
pub(crate) fn backfill_legacy_repo_scope(conn: &Connection) -> SubstrateResult<serde_json::Value> {
    let rows_backfilled = conn.execute(
        "INSERT INTO task_repo_scope (task_id, repo_id, scope, path_filters)
         SELECT t.task_id, p.default_repo_id, 'full', '[]'
         FROM tasks t
         JOIN projects p ON p.project_id = t.project_id
         WHERE p.default_repo_id IS NOT NULL
           AND NOT EXISTS (SELECT 1 FROM task_repo_scope s WHERE s.task_id = t.task_id)",
        [])?;

    let legacy_candidates: i64 = conn.query_row(
        "SELECT COUNT(*) FROM tasks t JOIN projects p ON p.project_id = t.project_id
         WHERE p.default_repo_id IS NOT NULL",
        [],
        |row| row.get(0))?;
    let still_unscoped: i64 = conn.query_row(
        "SELECT COUNT(*) FROM tasks t JOIN projects p ON p.project_id = t.project_id
         WHERE p.default_repo_id IS NOT NULL
           AND NOT EXISTS (SELECT 1 FROM task_repo_scope s WHERE s.task_id = t.task_id)",
        [],
        |row| row.get(0))?;
    if still_unscoped != 0 {
        return Err(SubstrateError::Migration(format!(
            "repo-scope backfill left {still_unscoped} legacy task(s) unscoped"
        )));
    }

    Ok(serde_json::json!({
        "rows_backfilled": rows_backfilled,
        "legacy_candidates": legacy_candidates,
        "verified": true,
    }))
}

fn schema_version_table_exists(conn: &Connection) -> SubstrateResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_version'",
        [],
        |row| row.get(0))?;
    Ok(count > 0)
}

/// Highest applied schema version, or an error if `schema_version` is absent
/// (database never migrated).
pub fn current_version(db: &Database) -> SubstrateResult<i64> {
    db.read(|conn| {
        if !schema_version_table_exists(conn)? {
            return Err(SubstrateError::Migration("schema_version table missing".to_string()));
        }
        let version: i64 =
            conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |row| row.get(0))?;
        Ok(version)
    })
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "migration_tests.rs"]
mod tests;
