// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

//! Audit/Event Log.
//!
//! Three append-only tables: state transitions, per-task sequenced events,
//! and free-form audit lines. `event_seq` is assigned inside the same write
//! closure that inserts the row, the same pattern checkpoints use for
//! `sequence_number`.

use std::collections::HashMap;

use rusqlite::params;
use serde_json::Value as Json;
use substrate_core::{AuditLevel, SubstrateResult, TaskAudit, TaskEvent, TaskStateTransition};

use crate::db::Database;

pub fn record_transition(
    db: &Database,
    task_id: &str,
    from_status: &str,
    to_status: &str,
    actor: &str,
    reason: Option<&str>,
    metadata: &HashMap<String, Json>,
    now: i64) -> SubstrateResult<()> {
    let task_id = task_id.to_string();
    let from_status = from_status.to_string();
    let to_status = to_status.to_string();
    let actor = actor.to_string();
    let reason = reason.map(str::to_string);
    let metadata_json = serde_json::to_string(metadata)?;

    db.write(move |conn| {
        conn.execute(
            "INSERT INTO task_state_transitions (task_id, from_status, to_status, actor, reason, metadata, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![task_id, from_status, to_status, actor, reason, metadata_json, now])?;
        Ok(())
    })
}

/// Append an event, assigning `event_seq = max(event_seq) + 1` for this task
/// inside the same write closure.
pub fn record_event(
    db: &Database,
    task_id: &str,
    event_type: &str,
    event_data: &HashMap<String, Json>,
    now: i64) -> SubstrateResult<i64> {
    let task_id = task_id.to_string();
    let event_type = event_type.to_string();
    let event_data_json = serde_json::to_string(event_data)?;

    db.write(move |conn| {
        let next_seq: i64 = conn.query_row(
            "SELECT COALESCE(MAX(event_seq), 0) + 1 FROM task_events WHERE task_id = ?1",
            params![task_id],
            |row| row.get(0))?;
        conn.execute(
            "INSERT INTO task_events (task_id, event_type, event_seq, event_data, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![task_id, event_type, next_seq, event_data_json, now])?;
        Ok(next_seq)
    })
}

pub fn record_audit(
    db: &Database,
    task_id: &str,
    level: AuditLevel,
    event_type: &str,
    payload: &HashMap<String, Json>,
    now: i64) -> SubstrateResult<()> {
    let task_id = task_id.to_string();
    let level_str = level.to_string();
    let event_type = event_type.to_string();
    let payload_json = serde_json::to_string(payload)?;

    db.write(move |conn| {
        conn.execute(
            "INSERT INTO task_audits (task_id, level, event_type, payload, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![task_id, level_str, event_type, payload_json, now])?;
        Ok(())
    })
}

pub fn list_transitions(db: &Database, task_id: &str) -> SubstrateResult<Vec<TaskStateTransition>> {
    let task_id = task_id.to_string();
    db.read(move |conn| {
        let mut stmt = conn.prepare(
            "SELECT from_status, to_status, actor, reason, metadata, created_at
             FROM task_state_transitions WHERE task_id = ?1 ORDER BY created_at")?;
        let rows = stmt
            .query_map(params![task_id], |row| {
                let metadata_json: String = row.get(4)?;
                Ok(TaskStateTransition {
                    task_id: substrate_core::task::TaskId::from_string(&task_id),
                    from_status: row.get(0)?,
                    to_status: row.get(1)?,
                    actor: row.get(2)?,
                    reason: row.get(3)?,
                    metadata: serde_json::from_str(&metadata_json).unwrap_or_default(),
                    created_at: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

pub fn list_events(db: &Database, task_id: &str) -> SubstrateResult<Vec<TaskEvent>> {
    let task_id = task_id.to_string();
    db.read(move |conn| {
        let mut stmt = conn.prepare(
            "SELECT event_type, event_seq, event_data, created_at
             FROM task_events WHERE task_id = ?1 ORDER BY event_seq")?;
        let rows = stmt
            .query_map(params![task_id], |row| {
                let event_data_json: String = row.get(2)?;
                Ok(TaskEvent {
                    task_id: substrate_core::task::TaskId::from_string(&task_id),
                    event_type: row.get(0)?,
                    event_seq: row.get(1)?,
                    event_data: serde_json::from_str(&event_data_json).unwrap_or_default(),
                    created_at: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

pub fn list_audits(db: &Database, task_id: &str) -> SubstrateResult<Vec<TaskAudit>> {
    let task_id = task_id.to_string();
    db.read(move |conn| {
        let mut stmt = conn.prepare(
            "SELECT level, event_type, payload, created_at
             FROM task_audits WHERE task_id = ?1 ORDER BY created_at")?;
        let rows = stmt
            .query_map(params![task_id], |row| {
                let level_str: String = row.get(0)?;
                let payload_json: String = row.get(2)?;
                Ok(TaskAudit {
                    task_id: substrate_core::task::TaskId::from_string(&task_id),
                    level: parse_level(&level_str),
                    event_type: row.get(1)?,
                    payload: serde_json::from_str(&payload_json).unwrap_or_default(),
                    created_at: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

fn parse_level(s: &str) -> AuditLevel {
    match s {
        "debug" => AuditLevel::Debug,
        "warn" => AuditLevel::Warn,
        "error" => AuditLevel::Error,
        _ => AuditLevel::Info,
    }
}

#[cfg(test)]
#[path = "audit_tests.rs"]
mod tests;
