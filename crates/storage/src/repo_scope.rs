// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

//! Repo Scope Enforcer.
//!
//! Turns a task's `task_repo_scope` rows, resolved against its project's
//! `repos` rows, into per-syscall allow/deny decisions. Symlinks and `..`
//! are resolved before any containment check — this is the sole defense
//! against traversal.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rusqlite::params;
use substrate_core::{RepoId, RepoScope, SubstrateError, SubstrateResult};

use crate::db::Database;

/// One repo resolved into a task's execution environment.
#[derive(Debug, Clone)]
pub struct TaskRepoContext {
    pub repo_id: RepoId,
    pub name: String,
    pub absolute_path: PathBuf,
    pub writable: bool,
    pub scope: RepoScope,
}

impl TaskRepoContext {
 /// Resolve `p` (absolute or repo-relative) and check it descends from
 /// `absolute_path`. The sole traversal defense: both sides are
 /// canonicalized (symlinks and `..` resolved) before comparison.
    pub fn is_within_repo(&self, p: &Path) -> SubstrateResult<bool> {
        let candidate = if p.is_absolute() { p.to_path_buf() } else { self.absolute_path.join(p) };
        let resolved = resolve_lexically_and_symlinks(&candidate)?;
        let root = resolve_lexically_and_symlinks(&self.absolute_path)?;
        Ok(resolved.starts_with(&root))
    }

 /// Whether `p` is allowed under this repo's scope, ignoring writability.
    pub fn is_allowed(&self, p: &Path) -> SubstrateResult<bool> {
        if !self.is_within_repo(p)? {
            return Ok(false);
        }
        match &self.scope {
            RepoScope::Full | RepoScope::ReadOnly => Ok(true),
            RepoScope::Paths { path_filters } => {
                let relative = self.repo_relative(p)?;
                Ok(path_filters.iter().any(|pattern| matches_filter(pattern, &relative)))
            }
        }
    }

    fn repo_relative(&self, p: &Path) -> SubstrateResult<PathBuf> {
        let candidate = if p.is_absolute() { p.to_path_buf() } else { self.absolute_path.join(p) };
        let resolved = resolve_lexically_and_symlinks(&candidate)?;
        let root = resolve_lexically_and_symlinks(&self.absolute_path)?;
        resolved
            .strip_prefix(&root)
            .map(Path::to_path_buf)
            .map_err(|_| SubstrateError::path_security(p.display().to_string(), self.repo_id.as_str(), self.scope.label()))
    }

    pub fn validate_read(&self, p: &Path) -> SubstrateResult<()> {
        if self.is_allowed(p)? {
            Ok(())
        } else {
            Err(SubstrateError::path_security(p.display().to_string(), self.repo_id.as_str(), self.scope.label()))
        }
    }

    pub fn validate_write(&self, p: &Path) -> SubstrateResult<()> {
        if matches!(self.scope, RepoScope::ReadOnly) || !self.writable {
            return Err(SubstrateError::path_security(p.display().to_string(), self.repo_id.as_str(), self.scope.label()));
        }
        self.validate_read(p)
    }
}

/// A glob filter `X` also matches `X/*` (directory shorthand).
fn matches_filter(pattern: &str, relative: &Path) -> bool {
    let relative_str = relative.to_string_lossy();
    let Ok(direct) = glob::Pattern::new(pattern) else { return false };
    if direct.matches(&relative_str) {
        return true;
    }
    let dir_pattern = format!("{}/*", pattern.trim_end_matches('/'));
    glob::Pattern::new(&dir_pattern).map(|p| p.matches(&relative_str)).unwrap_or(false)
}

/// Resolve `..`/`.` lexically, then canonicalize through the filesystem for
/// the longest existing prefix so a not-yet-created file (a write target)
/// still gets symlink resolution on its parent directories.
fn resolve_lexically_and_symlinks(p: &Path) -> SubstrateResult<PathBuf> {
    let lexical = lexical_normalize(p);
    let mut existing = lexical.clone();
    let mut tail = Vec::new();
    while !existing.exists() {
        match existing.file_name() {
            Some(name) => {
                tail.push(name.to_os_string());
                existing = existing.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("/"));
            }
            None => break,
        }
    }
    let mut resolved = if existing.exists() { existing.canonicalize()? } else { existing };
    for component in tail.into_iter().rev() {
        resolved.push(component);
    }
    Ok(resolved)
}

fn lexical_normalize(p: &Path) -> PathBuf {
    use std::path::Component;
    let mut out = PathBuf::new();
    for component in p.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Build the execution environment for a task: every repo it has scope rows
/// for, resolved against the project's repo specs and the workspace root.
pub fn build_environment(
    db: &Database,
    task_id: &str,
    workspace_root: &Path) -> SubstrateResult<HashMap<RepoId, TaskRepoContext>> {
    let task_id = task_id.to_string();
    let rows: Vec<(String, String, String, String, bool, String, String)> = db.read({
        let task_id = task_id.clone();
        move |conn| {
            let mut stmt = conn.prepare(
                "SELECT r.repo_id, r.name, r.workspace_relpath, r.role, r.is_writable, trs.scope, trs.path_filters
                 FROM task_repo_scope trs
                 JOIN repos r ON r.repo_id = trs.repo_id
                 WHERE trs.task_id = ?1")?;
            let rows = stmt
                .query_map(params![task_id], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)? != 0,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        }
    })?;

    let mut environment = HashMap::new();
    let mut seen_paths: Vec<PathBuf> = Vec::new();
    for (repo_id, name, relpath, _role, is_writable, scope_label, path_filters_json) in rows {
        let absolute_path = workspace_root.join(&relpath);
        if seen_paths.iter().any(|p| p == &absolute_path) {
            tracing::warn!(repo = %name, "repo path collides with another repo in this environment; first registration wins");
            continue;
        }
        seen_paths.push(absolute_path.clone());

        let path_filters: Vec<String> = serde_json::from_str(&path_filters_json).unwrap_or_default();
        let scope = match scope_label.as_str() {
            "full" => RepoScope::Full,
            "read_only" => RepoScope::ReadOnly,
            _ => RepoScope::Paths { path_filters },
        };

        let repo_id = RepoId::from_string(repo_id);
        environment.insert(
            repo_id.clone(),
            TaskRepoContext { repo_id, name, absolute_path, writable: is_writable, scope });
    }

    if environment.is_empty() {
        return Err(SubstrateError::NotFound(format!("task {task_id} has no repo scope rows and is not runnable")));
    }

    Ok(environment)
}

#[cfg(test)]
#[path = "repo_scope_tests.rs"]
mod tests;
