// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

//! Task identifier and durable task row.

use crate::status::{ExitReason, TaskStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::collections::HashMap;

crate::define_id! {
 /// Unique identifier for a task.
    pub struct TaskId("tsk-");
}

/// Relative priority; higher runs first. Purely advisory to schedulers outside the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Priority(pub i32);

impl Default for Priority {
    fn default() -> Self {
        Priority(0)
    }
}

/// Durable task row.
///
/// Invariant: `status.is_terminal ⇒ exit_reason.is_some ` — enforced by
/// [`ExitReason::is_valid_for`], checked before every transition commits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: TaskId,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub exit_reason: Option<ExitReason>,
    pub retry_count: u32,
    pub max_retries: u32,
    pub project_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub metadata: HashMap<String, Json>,
}

impl Task {
 /// A freshly queued task with no project scope, for tests and one-off tasks.
    pub fn new(task_id: TaskId, title: impl Into<String>, now: i64) -> Self {
        Task {
            task_id,
            title: title.into(),
            description: String::new(),
            status: TaskStatus::Queued,
            priority: Priority::default(),
            exit_reason: None,
            retry_count: 0,
            max_retries: 0,
            project_id: None,
            created_at: now,
            updated_at: now,
            metadata: HashMap::new(),
        }
    }

 /// Whether a `failed` task is eligible for automatic re-queue.
    pub fn eligible_for_retry(&self) -> bool {
        self.status == TaskStatus::Failed && self.retry_count < self.max_retries
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
