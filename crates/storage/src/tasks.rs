// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

//! Task Lifecycle.
//!
//! Enforces the closed transition table from `substrate_core::status` and
//! the `exit_reason` invariant. Each accepted transition updates the task
//! row, appends a transition row, and emits an event, all inside one write
//! closure.

use std::collections::HashMap;

use rusqlite::{params, OptionalExtension};
use serde_json::Value as Json;
use substrate_core::{ExitReason, SubstrateError, SubstrateResult, TaskStatus};

use crate::audit;
use crate::db::Database;

/// Apply a transition if legal; otherwise `IllegalTransition`.
#[allow(clippy::too_many_arguments)]
pub fn transition(
    db: &Database,
    task_id: &str,
    to: TaskStatus,
    actor: &str,
    exit_reason: Option<ExitReason>,
    reason: Option<&str>,
    metadata: &HashMap<String, Json>,
    now: i64) -> SubstrateResult<()> {
    if !ExitReason::is_valid_for(to, exit_reason.as_ref()) {
        return Err(SubstrateError::IllegalTransition {
            task_id: task_id.to_string(),
            from: "?".to_string(),
            to: to.to_string(),
        });
    }

    let task_id_owned = task_id.to_string();
    let to_str = to.to_string();
    let exit_reason_json = exit_reason.as_ref().map(serde_json::to_string).transpose()?;

    let from = db.write({
        let task_id = task_id_owned.clone();
        let to_str = to_str.clone();
        let exit_reason_json = exit_reason_json.clone();
        move |conn| {
            let current: String = conn
                .query_row("SELECT status FROM tasks WHERE task_id = ?1", params![task_id], |row| row.get(0))
                .optional()?
                .ok_or_else(|| SubstrateError::NotFound(format!("task {task_id}")))?;
            let from_status = TaskStatus::parse(&current)
                .ok_or_else(|| SubstrateError::IllegalTransition {
                    task_id: task_id.clone(),
                    from: current.clone(),
                    to: to_str.clone(),
                })?;

            if !from_status.can_transition_to(to) {
                return Err(SubstrateError::IllegalTransition { task_id: task_id.clone(), from: current, to: to_str });
            }

            conn.execute(
                "UPDATE tasks SET status = ?1, exit_reason = ?2, updated_at = ?3 WHERE task_id = ?4",
                params![to_str, exit_reason_json, now, task_id])?;
            Ok(from_status)
        }
    })?;

    audit::record_transition(
        db,
        &task_id_owned,
        &from.to_string(),
        &to_str,
        actor,
        reason,
        metadata,
        now)?;
    audit::record_event(db, &task_id_owned, "state_transition", &HashMap::new(), now)?;

    Ok(())
}

/// Re-queue a `failed` task whose `retry_count < max_retries`. Increments
/// `retry_count` and appends the `failed -> queued` transition.
pub fn retry(db: &Database, task_id: &str, actor: &str, now: i64) -> SubstrateResult<()> {
    let task_id_owned = task_id.to_string();
    db.write({
        let task_id = task_id_owned.clone();
        move |conn| {
            let (status, retry_count, max_retries): (String, u32, u32) = conn
                .query_row(
                    "SELECT status, retry_count, max_retries FROM tasks WHERE task_id = ?1",
                    params![task_id],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
                .optional()?
                .ok_or_else(|| SubstrateError::NotFound(format!("task {task_id}")))?;

            if status != "failed" {
                return Err(SubstrateError::IllegalTransition {
                    task_id: task_id.clone(),
                    from: status,
                    to: "queued".to_string(),
                });
            }
            if retry_count >= max_retries {
                return Err(SubstrateError::Checkpoint(format!(
                    "task {task_id} has exhausted its retry budget ({retry_count}/{max_retries})"
                )));
            }

            conn.execute(
                "UPDATE tasks SET status = 'queued', exit_reason = NULL, retry_count = retry_count + 1, updated_at = ?1
                 WHERE task_id = ?2",
                params![now, task_id])?;
            Ok(())
        }
    })?;

    audit::record_transition(db, &task_id_owned, "failed", "queued", actor, Some("retry"), &HashMap::new(), now)?;
    audit::record_event(db, &task_id_owned, "state_transition", &HashMap::new(), now)?;
    Ok(())
}

/// Resolve and record the project settings a task's `running` entry was
/// governed by, as an audit event carrying a hash of the resolved values.
pub fn record_resolved_settings(
    db: &Database,
    task_id: &str,
    settings: &HashMap<String, Json>,
    now: i64) -> SubstrateResult<()> {
    let settings_json = serde_json::to_string(settings)?;
    let hash = {
        use sha2::{Digest, Sha256};
        hex::encode(Sha256::digest(settings_json.as_bytes()))
    };
    let mut payload = HashMap::new();
    payload.insert("settings_hash".to_string(), Json::String(hash));
    audit::record_audit(db, task_id, substrate_core::AuditLevel::Info, "resolved_settings", &payload, now)
}

/// Every task registered under a project, newest first.
pub fn list_for_project(db: &Database, project_id: &str) -> SubstrateResult<Vec<String>> {
    let project_id = project_id.to_string();
    db.read(move |conn| {
        let mut stmt =
            conn.prepare("SELECT task_id FROM tasks WHERE project_id = ?1 ORDER BY created_at DESC")?;
        let rows = stmt.query_map(params![project_id], |row| row.get(0))?.collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

pub fn get_status(db: &Database, task_id: &str) -> SubstrateResult<TaskStatus> {
    let task_id = task_id.to_string();
    db.read(move |conn| {
        let status: String = conn
            .query_row("SELECT status FROM tasks WHERE task_id = ?1", params![task_id], |row| row.get(0))
            .optional()?
            .ok_or_else(|| SubstrateError::NotFound(format!("task {task_id}")))?;
        TaskStatus::parse(&status).ok_or_else(|| SubstrateError::NotFound(format!("unknown status {status}")))
    })
}

#[cfg(test)]
#[path = "tasks_tests.rs"]
mod tests;
