// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

//! Patches and commit links. Both append-only once recorded.

use serde::{Deserialize, Serialize};

crate::define_id! {
    pub struct PatchId("pat-");
}

/// A recorded intent to change a set of paths, with a deterministic diff hash
/// over its declared files. Always associated with a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub patch_id: PatchId,
    pub run_id: i64,
    pub step_id: Option<String>,
    pub intent: String,
    pub affected_paths: Vec<String>,
    pub diff_hash: String,
    pub created_at: i64,
}

/// Links a patch to the commit it landed in. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitLink {
    pub patch_id: PatchId,
    pub commit_hash: String,
    pub message: String,
    pub committed_at: i64,
    pub repo_root: String,
}

#[cfg(test)]
#[path = "patch_tests.rs"]
mod tests;
