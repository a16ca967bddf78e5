// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

//! A single execution attempt of a task, and the task-lease fields it carries.

use crate::task::TaskId;
use serde::{Deserialize, Serialize};

/// Status of one run attempt. Narrower than [`crate::status::TaskStatus`]: a run
/// never observes `paused` or `waiting_lock` transitions after it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    WaitingLock,
    Running,
    Succeeded,
    Failed,
}

crate::simple_display! {
    RunStatus {
        Queued => "queued",
        WaitingLock => "waiting_lock",
        Running => "running",
        Succeeded => "succeeded",
        Failed => "failed",
    }
}

/// How the run's work was executed (subprocess, container, remote — opaque to the core).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionMode(pub String);

impl Default for ExecutionMode {
    fn default() -> Self {
        ExecutionMode("default".to_string())
    }
}

/// One execution attempt of a task.
///
/// `lease_holder`/`lease_until` are the task-lease fields the lock manager
/// mutates directly; a run has a *live* lease iff both are set and
/// `lease_until >= now`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRun {
    pub run_id: i64,
    pub task_id: TaskId,
    pub status: RunStatus,
    pub started_at: i64,
    pub completed_at: Option<i64>,
    pub lease_holder: Option<String>,
    pub lease_until: Option<i64>,
    pub execution_mode: ExecutionMode,
    pub error: Option<String>,
}

impl TaskRun {
    pub fn has_live_lease_at(&self, now: i64) -> bool {
        matches!((&self.lease_holder, self.lease_until), (Some(_), Some(until)) if until >= now)
    }
}
