// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

//! Task status enum and the legal transition table.

use serde::{Deserialize, Serialize};

/// Status of a task: a closed set declared in exactly one place. Earlier
/// drafts extended this informally (e.g. a bare `paused` string); here it is
/// an explicit, exhaustive enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Queued,
    WaitingLock,
    Running,
    Paused,
    Succeeded,
    Failed,
    Cancelled,
    TimedOut,
}

crate::simple_display! {
    TaskStatus {
        Queued => "queued",
        WaitingLock => "waiting_lock",
        Running => "running",
        Paused => "paused",
        Succeeded => "succeeded",
        Failed => "failed",
        Cancelled => "cancelled",
        TimedOut => "timed_out",
    }
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Succeeded | TaskStatus::Failed | TaskStatus::Cancelled | TaskStatus::TimedOut)
    }

 /// Parse from the string stored in the `status` column.
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "queued" => TaskStatus::Queued,
            "waiting_lock" => TaskStatus::WaitingLock,
            "running" => TaskStatus::Running,
            "paused" => TaskStatus::Paused,
            "succeeded" => TaskStatus::Succeeded,
            "failed" => TaskStatus::Failed,
            "cancelled" => TaskStatus::Cancelled,
            "timed_out" => TaskStatus::TimedOut,
            _ => return None,
        })
    }

 /// The fixed set of legal `(from, to)` edges. Extend here, not ad hoc
 /// at call sites, so the whole transition graph stays in one place.
    pub fn allowed_edges() -> &'static [(TaskStatus, TaskStatus)] {
        use TaskStatus::*;
        &[
            (Queued, WaitingLock),
            (Queued, Cancelled),
            (WaitingLock, Running),
            (WaitingLock, Cancelled),
            (Running, Paused),
            (Paused, Running),
            (Running, Succeeded),
            (Running, Failed),
            (Running, Cancelled),
            (Running, TimedOut),
            (Paused, Cancelled),
            (Paused, Failed),
            (Failed, Queued), // retry
        ]
    }

 /// Whether `self -> to` is a legal transition. Terminal states accept no
 /// outgoing edge except the explicit `Failed -> Queued` retry.
    pub fn can_transition_to(self, to: TaskStatus) -> bool {
        Self::allowed_edges().contains(&(self, to))
    }
}

/// Why a terminal task stopped. `Success` is the only exit reason allowed with
/// [`TaskStatus::Succeeded`]; every other terminal status requires a non-empty one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum ExitReason {
    Success,
    Error(String),
    Cancelled(String),
    LockExpired,
    Timeout,
}

impl ExitReason {
    pub fn label(&self) -> &str {
        match self {
            ExitReason::Success => "success",
            ExitReason::Error(_) => "error",
            ExitReason::Cancelled(_) => "cancelled",
            ExitReason::LockExpired => "lock_expired",
            ExitReason::Timeout => "timeout",
        }
    }

 /// Invariant check for a proposed `(status, exit_reason)` pair.
    pub fn is_valid_for(status: TaskStatus, reason: Option<&ExitReason>) -> bool {
        match (status.is_terminal(), reason) {
            (false, _) => true,
            (true, None) => false,
            (true, Some(ExitReason::Success)) => status == TaskStatus::Succeeded,
            (true, Some(_)) => status != TaskStatus::Succeeded,
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
