// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::checkpoint::{EvidenceExpected, EvidenceItem, EvidencePack, PassPolicy, VerificationStatus};
use crate::status::TaskStatus;
use crate::task::{Priority, Task, TaskId};
use std::collections::HashMap;

crate::builder! {
    pub struct TaskBuilder => Task {
        into { title: String = "test task" }
        set { status: TaskStatus = TaskStatus::Queued }
        set { priority: Priority = Priority::default() }
        set { retry_count: u32 = 0 }
        set { max_retries: u32 = 0 }
        option { project_id: String = None }
        computed { task_id: TaskId = TaskId::new() }
        computed { description: String = String::new() }
        computed { exit_reason: Option<crate::status::ExitReason> = None }
        computed { created_at: i64 = 1_000_000 }
        computed { updated_at: i64 = 1_000_000 }
        computed { metadata: HashMap<String, serde_json::Value> = HashMap::new() }
    }
}

/// A single verified `artifact_exists` item, useful as filler evidence.
pub fn verified_artifact_item(path: &str) -> EvidenceItem {
    let mut item = EvidenceItem::pending(EvidenceExpected::ArtifactExists {
        path: path.to_string(),
        kind: None,
    });
    item.verified = true;
    item.verification_status = VerificationStatus::Verified;
    item.verified_at = Some(1_000_000);
    item
}

pub fn passing_pack(path: &str) -> EvidencePack {
    EvidencePack::new(vec![verified_artifact_item(path)], PassPolicy::RequireAll)
}

pub mod strategies {
    use super::TaskStatus;
    use proptest::prelude::*;

    pub fn arb_task_status() -> impl Strategy<Value = TaskStatus> {
        prop_oneof![
            Just(TaskStatus::Queued),
            Just(TaskStatus::WaitingLock),
            Just(TaskStatus::Running),
            Just(TaskStatus::Paused),
            Just(TaskStatus::Succeeded),
            Just(TaskStatus::Failed),
            Just(TaskStatus::Cancelled),
            Just(TaskStatus::TimedOut),
        ]
    }
}
