// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

//! Project and repo registration — the data behind the `project` CLI
//! surface. Not one of the twelve numbered components; a thin
//! CRUD layer the CLI calls into so schema knowledge stays in this crate.

use std::path::PathBuf;

use rusqlite::{params, OptionalExtension};
use substrate_core::{Project, ProjectId, ProjectStatus, RepoId, RepoRole, RepoSpec, SubstrateError, SubstrateResult};

use crate::db::Database;

pub fn add_project(db: &Database, name: &str, id: Option<ProjectId>, now: i64) -> SubstrateResult<Project> {
    let project_id = id.unwrap_or_else(ProjectId::new);
    let name = name.to_string();
    let id_str = project_id.as_str().to_string();
    db.write({
        let id_str = id_str.clone();
        let name = name.clone();
        move |conn| {
            Ok(conn.execute(
                "INSERT INTO projects (project_id, name, status, created_at, updated_at) VALUES (?1, ?2, 'active', ?3, ?3)",
                params![id_str, name, now])?)
        }
    })?;
    Ok(Project {
        project_id,
        name,
        status: ProjectStatus::Active,
        default_repo_id: None,
        settings: Default::default(),
        created_at: now,
        updated_at: now,
    })
}

pub fn list_projects(db: &Database) -> SubstrateResult<Vec<Project>> {
    db.read(|conn| {
        let mut stmt = conn.prepare(
            "SELECT project_id, name, status, default_repo_id, settings, created_at, updated_at FROM projects ORDER BY created_at")?;
        let rows = stmt.query_map([], row_to_project)?.collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

pub fn get_project(db: &Database, project_id: &str) -> SubstrateResult<Project> {
    let project_id = project_id.to_string();
    db.read(move |conn| {
        conn.query_row(
            "SELECT project_id, name, status, default_repo_id, settings, created_at, updated_at FROM projects WHERE project_id = ?1",
            params![project_id],
            row_to_project)
        .optional()?
        .ok_or_else(|| SubstrateError::NotFound(format!("project {project_id}")))
    })
}

#[allow(clippy::too_many_arguments)]
pub fn add_repo(
    db: &Database,
    project_id: &str,
    name: &str,
    workspace_relpath: &PathBuf,
    role: RepoRole,
    is_writable: bool,
    default_branch: &str) -> SubstrateResult<RepoSpec> {
    let repo_id = RepoId::new();
    let project_id_owned = project_id.to_string();
    let name = name.to_string();
    let relpath = workspace_relpath.to_string_lossy().to_string();
    let role_str = role.to_string();
    let default_branch = default_branch.to_string();
    let id_str = repo_id.as_str().to_string();

    db.write({
        let id_str = id_str.clone();
        let project_id = project_id_owned.clone();
        let name = name.clone();
        let relpath = relpath.clone();
        let role_str = role_str.clone();
        let default_branch = default_branch.clone();
        move |conn| {
            Ok(conn.execute(
                "INSERT INTO repos (repo_id, project_id, name, default_branch, workspace_relpath, role, is_writable)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![id_str, project_id, name, default_branch, relpath, role_str, is_writable as i64])?)
        }
    })?;

    Ok(RepoSpec {
        repo_id,
        project_id: ProjectId::from_string(&project_id_owned),
        name,
        remote_url: None,
        default_branch,
        workspace_relpath: workspace_relpath.clone(),
        role,
        is_writable,
        metadata: Default::default(),
    })
}

pub fn list_repos(db: &Database, project_id: &str) -> SubstrateResult<Vec<RepoSpec>> {
    let project_id = project_id.to_string();
    db.read(move |conn| {
        let mut stmt = conn.prepare(
            "SELECT repo_id, project_id, name, remote_url, default_branch, workspace_relpath, role, is_writable, metadata
             FROM repos WHERE project_id = ?1 ORDER BY name")?;
        let rows = stmt.query_map(params![project_id], row_to_repo)?.collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Whether a project is ready to be treated as multi-repo: it has at least
/// one registered repo. A project with zero repos is still on the legacy
/// single-workspace model the migration below promotes it out of.
pub struct MigrationCheck {
    pub project_id: String,
    pub repo_count: i64,
    pub ready: bool,
}

pub fn migrate_check(db: &Database, project_id: &str) -> SubstrateResult<MigrationCheck> {
    let repos = list_repos(db, project_id)?;
    Ok(MigrationCheck { project_id: project_id.to_string(), repo_count: repos.len() as i64, ready: !repos.is_empty() })
}

pub struct MigrationResult {
    pub created_repo: Option<RepoSpec>,
    pub dry_run: bool,
}

/// Register a single `root` repo for a project that currently has none,
/// promoting it onto the multi-repo model. A no-op (besides the dry-run
/// report) if the project already has repos. `workspace_root`, if given,
/// becomes the new repo's `workspace_relpath`; it defaults to `.` (the repo
/// spans the whole project workspace), matching the legacy single-workspace
/// layout this migration is promoting the project out of.
pub fn migrate_to_multi_repo(
    db: &Database,
    project_id: &str,
    dry_run: bool,
    workspace_root: Option<&PathBuf>) -> SubstrateResult<MigrationResult> {
    let relpath = workspace_root.cloned().unwrap_or_else(|| PathBuf::from("."));
    let existing = list_repos(db, project_id)?;
    if !existing.is_empty() {
        return Ok(MigrationResult { created_repo: None, dry_run });
    }
    if dry_run {
        return Ok(MigrationResult {
            created_repo: Some(RepoSpec {
                repo_id: RepoId::new(),
                project_id: ProjectId::from_string(project_id),
                name: "root".to_string(),
                remote_url: None,
                default_branch: "main".to_string(),
                workspace_relpath: relpath,
                role: RepoRole::Code,
                is_writable: true,
                metadata: Default::default(),
            }),
            dry_run: true,
        });
    }
    let repo = add_repo(db, project_id, "root", &relpath, RepoRole::Code, true, "main")?;
    Ok(MigrationResult { created_repo: Some(repo), dry_run: false })
}

fn row_to_project(row: &rusqlite::Row) -> rusqlite::Result<Project> {
    let id_str: String = row.get(0)?;
    let status_str: String = row.get(2)?;
    let default_repo: Option<String> = row.get(3)?;
    let settings_json: String = row.get(4)?;
    Ok(Project {
        project_id: ProjectId::from_string(&id_str),
        name: row.get(1)?,
        status: parse_status(&status_str),
        default_repo_id: default_repo.map(|s| RepoId::from_string(&s)),
        settings: serde_json::from_str(&settings_json).unwrap_or_default(),
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn row_to_repo(row: &rusqlite::Row) -> rusqlite::Result<RepoSpec> {
    let repo_id_str: String = row.get(0)?;
    let project_id_str: String = row.get(1)?;
    let role_str: String = row.get(6)?;
    let is_writable: i64 = row.get(7)?;
    let metadata_json: String = row.get(8)?;
    Ok(RepoSpec {
        repo_id: RepoId::from_string(&repo_id_str),
        project_id: ProjectId::from_string(&project_id_str),
        name: row.get(2)?,
        remote_url: row.get(3)?,
        default_branch: row.get(4)?,
        workspace_relpath: PathBuf::from(row.get::<_, String>(5)?),
        role: parse_role(&role_str),
        is_writable: is_writable != 0,
        metadata: serde_json::from_str(&metadata_json).unwrap_or_default(),
    })
}

fn parse_status(s: &str) -> ProjectStatus {
    match s {
        "archived" => ProjectStatus::Archived,
        "deleted" => ProjectStatus::Deleted,
        _ => ProjectStatus::Active,
    }
}

fn parse_role(s: &str) -> RepoRole {
    match s {
        "docs" => RepoRole::Docs,
        "infra" => RepoRole::Infra,
        "mono-subdir" => RepoRole::MonoSubdir,
        _ => RepoRole::Code,
    }
}

#[cfg(test)]
#[path = "projects_tests.rs"]
mod tests;
