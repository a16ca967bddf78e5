// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

//! Append-only audit trail: state transitions, events, and audit lines.
//! Basis for [replay](crate).

use crate::task::TaskId;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::collections::HashMap;

/// An append-only record of a task status change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStateTransition {
    pub task_id: TaskId,
    pub from_status: String,
    pub to_status: String,
    pub actor: String,
    pub reason: Option<String>,
    pub metadata: HashMap<String, Json>,
    pub created_at: i64,
}

/// An append-only per-task record with a monotonic sequence number, assigned
/// by the writer under the same transaction that inserts the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEvent {
    pub task_id: TaskId,
    pub event_type: String,
    pub event_seq: i64,
    pub event_data: HashMap<String, Json>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditLevel {
    Debug,
    Info,
    Warn,
    Error,
}

crate::simple_display! {
    AuditLevel {
        Debug => "debug",
        Info => "info",
        Warn => "warn",
        Error => "error",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskAudit {
    pub task_id: TaskId,
    pub level: AuditLevel,
    pub event_type: String,
    pub payload: HashMap<String, Json>,
    pub created_at: i64,
}

/// One merged entry in a [replay](crate) timeline — the common shape transitions,
/// events, and audits are flattened into for ordering and display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub created_at: i64,
 /// Tie-break order when `created_at` matches: transitions < events < audits.
    pub source_order: u8,
    pub source: TimelineSource,
    pub summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineSource {
    Transition,
    Event,
    Audit,
}

impl TimelineSource {
    pub fn order(self) -> u8 {
        match self {
            TimelineSource::Transition => 0,
            TimelineSource::Event => 1,
            TimelineSource::Audit => 2,
        }
    }
}

/// Summary counts produced by a replay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplaySummary {
    pub transition_count: usize,
    pub event_count: usize,
    pub audit_count: usize,
    pub status_sequence: Vec<String>,
    pub duration_ms: Option<i64>,
}

#[cfg(test)]
#[path = "audit_tests.rs"]
mod tests;
