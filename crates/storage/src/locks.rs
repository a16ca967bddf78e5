// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

//! Lock Manager.
//!
//! Task leases and file-path leases share one design: both are rows with a
//! holder and an expiry, both acquired/renewed/released under a single write
//! closure so the check-then-act is atomic, and both treat `expires_at <
//! now` as unheld rather than actively revoking.

use rusqlite::{params, OptionalExtension};
use substrate_core::{LockToken, SubstrateError, SubstrateResult};

use crate::db::Database;

/// Acquire the task lease.
///
/// Finds the latest queued/waiting-lock run, and fails with
/// [`SubstrateError::LockConflict`] if another holder already has a live
/// lease on this task.
pub fn acquire_task(db: &Database, task_id: &str, holder: &str, ttl_secs: i64, now: i64) -> SubstrateResult<LockToken> {
    let task_id = task_id.to_string();
    let holder = holder.to_string();
    db.write(move |conn| {
        let existing: Option<(i64, String)> = conn
            .query_row(
                "SELECT run_id, lease_holder FROM task_runs
                 WHERE task_id = ?1 AND lease_holder IS NOT NULL AND lease_until >= ?2
                 ORDER BY started_at DESC LIMIT 1",
                params![task_id, now],
                |row| Ok((row.get(0)?, row.get(1)?)))
            .optional()?;

        if let Some((_, owner)) = &existing {
            if owner != &holder {
                return Err(SubstrateError::lock_conflict(format!("task:{task_id}"), owner.clone(), true));
            }
        }

        let candidate: Option<i64> = conn
            .query_row(
                "SELECT run_id FROM task_runs
                 WHERE task_id = ?1 AND status IN ('queued', 'waiting_lock')
                 ORDER BY started_at DESC LIMIT 1",
                params![task_id],
                |row| row.get(0))
            .optional()?;

        let run_id = candidate.ok_or_else(|| SubstrateError::NotFound(format!("no queued run for task {task_id}")))?;
        let expires_at = now + ttl_secs;

        let updated = conn.execute(
            "UPDATE task_runs SET lease_holder = ?1, lease_until = ?2, status = 'running'
             WHERE run_id = ?3 AND (lease_holder IS NULL OR lease_until < ?4) AND status IN ('queued', 'waiting_lock')",
            params![holder, expires_at, run_id, now])?;
        if updated == 0 {
            return Err(SubstrateError::lock_conflict(format!("task:{task_id}"), "unknown".to_string(), true));
        }

        Ok(LockToken::task(task_id.clone(), run_id, holder.clone(), expires_at))
    })
}

/// Acquire path leases atomically). All rows are
/// written or none are.
pub fn acquire_paths(
    db: &Database,
    task_id: &str,
    holder: &str,
    paths: &[String],
    ttl_secs: i64,
    repo_root: &str,
    now: i64) -> SubstrateResult<LockToken> {
    let task_id = task_id.to_string();
    let holder = holder.to_string();
    let repo_root = repo_root.to_string();
    let paths = paths.to_vec();
    db.write(move |conn| {
        let run_id: i64 = conn
            .query_row(
                "SELECT run_id FROM task_runs WHERE task_id = ?1 ORDER BY started_at DESC LIMIT 1",
                params![task_id],
                |row| row.get(0))
            .optional()?
            .ok_or_else(|| SubstrateError::NotFound(format!("no run for task {task_id}")))?;

        for path in &paths {
            let conflict: Option<(String, i64, String)> = conn
                .query_row(
                    "SELECT locked_by_task, locked_by_run, holder FROM file_locks
                     WHERE repo_root = ?1 AND file_path = ?2 AND expires_at >= ?3",
                    params![repo_root, path, now],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
                .optional()?;
            if let Some((owner_task, owner_run, owner_holder)) = conflict {
                if owner_holder != holder {
                    return Err(SubstrateError::lock_conflict(
                        format!("file:{path}"),
                        format!("{owner_task}:{owner_run}"),
                        true));
                }
            }
        }

        for path in &paths {
            conn.execute(
                "INSERT INTO file_locks (repo_root, file_path, locked_by_task, locked_by_run, holder, expires_at, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, '{}')
                 ON CONFLICT(repo_root, file_path) DO UPDATE SET
                     locked_by_task = excluded.locked_by_task,
                     locked_by_run = excluded.locked_by_run,
                     holder = excluded.holder,
                     expires_at = excluded.expires_at",
                params![repo_root, path, task_id, run_id, holder, now + ttl_secs])?;
        }

        Ok(LockToken::files(task_id.clone(), run_id, holder.clone(), now + ttl_secs))
    })
}

/// Renew a lease, task or files, moving `expires_at` forward only if the
/// holder still matches and the lease has not already lapsed.
pub fn renew(db: &Database, token: &LockToken, ttl_secs: i64, now: i64) -> SubstrateResult<LockToken> {
    let run_id = token
        .run_id()
        .ok_or_else(|| SubstrateError::NotFound(format!("malformed lock_id: {}", token.lock_id)))?;
    let holder = token.holder.clone();
    let new_expires = now + ttl_secs;
    let lock_id = token.lock_id.clone();
    let kind = token.kind;
    let task_id = token.task_id.clone();

    db.write(move |conn| {
        let updated = match kind {
            substrate_core::LockKind::Task => conn.execute(
                "UPDATE task_runs SET lease_until = ?1 WHERE run_id = ?2 AND lease_holder = ?3 AND lease_until >= ?4",
                params![new_expires, run_id, holder, now])?,
            substrate_core::LockKind::Files => conn.execute(
                "UPDATE file_locks SET expires_at = ?1
                 WHERE locked_by_task = ?2 AND locked_by_run = ?3 AND holder = ?4 AND expires_at >= ?5",
                params![new_expires, task_id, run_id, holder, now])?,
        };
        if updated == 0 {
            return Err(SubstrateError::lock_conflict(lock_id.clone(), "expired".to_string(), false));
        }
        Ok(())
    })?;

    Ok(match token.kind {
        substrate_core::LockKind::Task => LockToken::task(token.task_id.clone(), run_id, token.holder.clone(), new_expires),
        substrate_core::LockKind::Files => LockToken::files(token.task_id.clone(), run_id, token.holder.clone(), new_expires),
    })
}

/// Release a lease. Idempotent: releasing an already-released or expired
/// lease is a no-op.
pub fn release(db: &Database, token: &LockToken) -> SubstrateResult<()> {
    let run_id = token
        .run_id()
        .ok_or_else(|| SubstrateError::NotFound(format!("malformed lock_id: {}", token.lock_id)))?;
    let holder = token.holder.clone();
    let kind = token.kind;
    let task_id = token.task_id.clone();

    db.write(move |conn| {
        match kind {
            substrate_core::LockKind::Task => {
                conn.execute(
                    "UPDATE task_runs SET lease_holder = NULL, lease_until = NULL
                     WHERE run_id = ?1 AND lease_holder = ?2",
                    params![run_id, holder])?;
            }
            substrate_core::LockKind::Files => {
                conn.execute(
                    "DELETE FROM file_locks WHERE locked_by_task = ?1 AND locked_by_run = ?2 AND holder = ?3",
                    params![task_id, run_id, holder])?;
            }
        }
        Ok(())
    })
}

/// Delete every lease (task and file) whose `expires_at` has passed. Run
/// periodically by an external sweeper; not required for correctness since
/// readers already ignore expired rows.
pub fn sweep_expired(db: &Database, now: i64) -> SubstrateResult<u64> {
    db.write(move |conn| {
        let files = conn.execute("DELETE FROM file_locks WHERE expires_at < ?1", params![now])?;
        let tasks = conn.execute(
            "UPDATE task_runs SET lease_holder = NULL, lease_until = NULL
             WHERE lease_until IS NOT NULL AND lease_until < ?1",
            params![now])?;
        Ok((files + tasks) as u64)
    })
}

#[cfg(test)]
#[path = "locks_tests.rs"]
mod tests;
