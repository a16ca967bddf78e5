// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

//! Checkpoint and evidence data model.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::collections::HashMap;

crate::define_id! {
    pub struct CheckpointId("ckp-");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Failed,
}

crate::simple_display! {
    VerificationStatus {
        Pending => "pending",
        Verified => "verified",
        Failed => "failed",
    }
}

/// The closed set of evidence kinds. Unknown kinds are refused at
/// validation time (when the pack is built), not deferred to verify time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvidenceExpected {
 /// `path`, optional `type` in {file, directory, any}.
    ArtifactExists { path: String, kind: Option<ArtifactKind> },
 /// `path`, expected hex-encoded sha256.
    FileSha256 { path: String, sha256: String },
 /// Structural only — asserts the exit code recorded at checkpoint time,
 /// never re-executes the command.
    CommandExit { exit_code: i32 },
 /// `table`, `where` equality filters, expected `values` for the matched row.
    DbRow {
        table: String,
        r#where: HashMap<String, Json>,
        values: HashMap<String, Json>,
        db_path: Option<String>,
    },
}

impl EvidenceExpected {
    pub fn kind_label(&self) -> &'static str {
        match self {
            EvidenceExpected::ArtifactExists { .. } => "artifact_exists",
            EvidenceExpected::FileSha256 { .. } => "file_sha256",
            EvidenceExpected::CommandExit { .. } => "command_exit",
            EvidenceExpected::DbRow { .. } => "db_row",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    File,
    Directory,
    Any,
}

/// A single piece of evidence attached to a checkpoint. `expected` is
/// immutable once the checkpoint commits; the verification result fields
/// mutate in place on re-verify.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub expected: EvidenceExpected,
    pub verified: bool,
    pub verification_status: VerificationStatus,
    pub verification_error: Option<String>,
    pub verified_at: Option<i64>,
}

impl EvidenceItem {
    pub fn pending(expected: EvidenceExpected) -> Self {
        EvidenceItem {
            expected,
            verified: false,
            verification_status: VerificationStatus::Pending,
            verification_error: None,
            verified_at: None,
        }
    }
}

/// How the items in a pack combine into a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassPolicy {
    RequireAll,
    AllowPartial,
    MinVerified(u32),
}

impl Default for PassPolicy {
    fn default() -> Self {
        PassPolicy::RequireAll
    }
}

impl PassPolicy {
    pub fn evaluate(self, items: &[EvidenceItem]) -> bool {
        if items.is_empty() {
            return matches!(self, PassPolicy::AllowPartial);
        }
        let verified = items.iter().filter(|i| i.verified).count();
        match self {
            PassPolicy::RequireAll => verified == items.len(),
            PassPolicy::AllowPartial => verified >= 1,
            PassPolicy::MinVerified(k) => verified as u32 >= k,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidencePack {
    pub items: Vec<EvidenceItem>,
    pub policy: PassPolicy,
}

impl EvidencePack {
    pub fn new(items: Vec<EvidenceItem>, policy: PassPolicy) -> Self {
        EvidencePack { items, policy }
    }

 /// Current verdict given each item's last-recorded `verified` flag.
    pub fn passes(&self) -> bool {
        self.policy.evaluate(&self.items)
    }
}

/// An immutable, numbered snapshot of task state with its evidence pack.
///
/// `sequence_number` is contiguous and strictly increasing per task, assigned
/// by the write closure that commits the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub checkpoint_id: CheckpointId,
    pub task_id: crate::task::TaskId,
    pub work_item_id: Option<String>,
    pub checkpoint_type: String,
    pub sequence_number: i64,
    pub snapshot_data: HashMap<String, Json>,
    pub evidence_pack: EvidencePack,
    pub verified: bool,
    pub last_verified_at: Option<i64>,
    pub metadata: HashMap<String, Json>,
    pub created_at: i64,
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
