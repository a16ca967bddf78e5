// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

//! Lease token shared by the task-lock and file-lock halves of the lock manager.
//!
//! The token is advisory; the persisted row (`task_runs.lease_*` or
//! `file_locks`) is authoritative. `renew`/`release` re-check identity against
//! that row server-side rather than trusting the in-memory token.

use serde::{Deserialize, Serialize};

/// What kind of resource a [`LockToken`] was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockKind {
    Task,
    Files,
}

/// A lease over a task or a set of file paths.
///
/// For file leases, `lock_id` is `files:<task_id>:<run_id>` so release is
/// keyed by run rather than by an individual path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockToken {
    pub lock_id: String,
    pub kind: LockKind,
    pub task_id: String,
    pub holder: String,
    pub expires_at: i64,
}

impl LockToken {
    pub fn task(task_id: impl Into<String>, run_id: i64, holder: impl Into<String>, expires_at: i64) -> Self {
        let task_id = task_id.into();
        LockToken {
            lock_id: format!("task:{task_id}:{run_id}"),
            kind: LockKind::Task,
            task_id,
            holder: holder.into(),
            expires_at,
        }
    }

    pub fn files(task_id: impl Into<String>, run_id: i64, holder: impl Into<String>, expires_at: i64) -> Self {
        let task_id = task_id.into();
        LockToken {
            lock_id: format!("files:{task_id}:{run_id}"),
            kind: LockKind::Files,
            task_id,
            holder: holder.into(),
            expires_at,
        }
    }

 /// Extract the `run_id` encoded in `lock_id` (both kinds carry one).
    pub fn run_id(&self) -> Option<i64> {
        self.lock_id.rsplit(':').next()?.parse().ok()
    }
}

#[cfg(test)]
#[path = "lease_tests.rs"]
mod tests;
