// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

//! Projects, repo specs, and the per-task repo scope that the enforcer
//! resolves into allow/deny decisions.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::collections::HashMap;
use std::path::PathBuf;

crate::define_id! {
    pub struct ProjectId("prj-");
}

crate::define_id! {
    pub struct RepoId("rpo-");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Active,
    Archived,
    Deleted,
}

crate::simple_display! {
    ProjectStatus {
        Active => "active",
        Archived => "archived",
        Deleted => "deleted",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub project_id: ProjectId,
    pub name: String,
    pub status: ProjectStatus,
    pub default_repo_id: Option<RepoId>,
    pub settings: HashMap<String, Json>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// What kind of tree a repo is, purely descriptive (doesn't affect enforcement).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepoRole {
    Code,
    Docs,
    Infra,
    MonoSubdir,
}

crate::simple_display! {
    RepoRole {
        Code => "code",
        Docs => "docs",
        Infra => "infra",
        MonoSubdir => "mono-subdir",
    }
}

/// A repository registered under a project.
///
/// Invariant (enforced by callers constructing an execution environment, not
/// by this type alone): within one project, repo names are unique and
/// resolved `workspace_relpath`s are mutually non-ancestral.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoSpec {
    pub repo_id: RepoId,
    pub project_id: ProjectId,
    pub name: String,
    pub remote_url: Option<String>,
    pub default_branch: String,
    pub workspace_relpath: PathBuf,
    pub role: RepoRole,
    pub is_writable: bool,
    pub metadata: HashMap<String, Json>,
}

/// A task's access policy over one repo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepoScope {
 /// Any path under the repo is allowed for both reads and writes.
    Full,
 /// Paths must match at least one glob filter, repo-relative.
    Paths { path_filters: Vec<String> },
 /// Reads allowed anywhere under the repo; writes always denied.
    ReadOnly,
}

impl RepoScope {
    pub fn label(&self) -> &'static str {
        match self {
            RepoScope::Full => "full",
            RepoScope::Paths { .. } => "paths",
            RepoScope::ReadOnly => "read_only",
        }
    }
}

/// Row tying a task to a repo with a scope.
/// Owned by the task: created with it, deleted with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRepoScope {
    pub task_id: crate::task::TaskId,
    pub repo_id: RepoId,
    pub scope: RepoScope,
}

#[cfg(test)]
#[path = "project_tests.rs"]
mod tests;
