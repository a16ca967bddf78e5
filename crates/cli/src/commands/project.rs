// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

//! `substrate project` — project and repo registration.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use substrate_storage::Database;

use crate::color;
use crate::exit_error::ExitError;
use crate::output::OutputFormat;

#[derive(Args)]
pub struct ProjectArgs {
    #[command(subcommand)]
    pub command: ProjectCommand,
}

#[derive(Subcommand)]
pub enum ProjectCommand {
 /// Register a new project
    Add {
        path: PathBuf,
        #[arg(long)]
        id: Option<String>,
    },
 /// List known projects
    List {},
 /// Multi-repo migration commands
    Migrate {
        #[command(subcommand)]
        command: MigrateCommand,
    },
 /// Print a task-less project timeline (state transitions across its tasks)
    Trace {
        project_id: String,
        #[arg(long, default_value = "table")]
        format: OutputFormat,
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Subcommand)]
pub enum MigrateCommand {
 /// Report whether a project (or all projects) is ready for the multi-repo model
    Check {
        id: Option<String>,
        #[arg(long)]
        all: bool,
    },
 /// Register a `root` repo for a project that has none yet
    ToMultiRepo {
        id: String,
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        workspace_root: Option<PathBuf>,
    },
 /// List the repos registered under a project
    ListRepos { id: String },
}

pub fn handle(db: &Database, args: ProjectArgs, now: i64) -> Result<(), ExitError> {
    match args.command {
        ProjectCommand::Add { path, id } => handle_add(db, &path, id, now),
        ProjectCommand::List {} => handle_list(db),
        ProjectCommand::Migrate { command } => handle_migrate(db, command),
        ProjectCommand::Trace { project_id, format, limit } => handle_trace(db, &project_id, format, limit),
    }
}

fn handle_add(db: &Database, path: &PathBuf, id: Option<String>, now: i64) -> Result<(), ExitError> {
    let name = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let project_id = id.map(|s| substrate_core::ProjectId::from_string(&s));
    let project = substrate_storage::add_project(db, &name, project_id, now)
        .map_err(|e| ExitError::user(format!("could not add project: {e}")))?;
    println!("{} {}", color::header("created"), project.project_id.as_str());
    Ok(())
}

fn handle_list(db: &Database) -> Result<(), ExitError> {
    let projects = substrate_storage::list_projects(db).map_err(|e| ExitError::user(e.to_string()))?;
    if projects.is_empty() {
        println!("No projects registered");
        return Ok(());
    }
    println!("{}  {}  {}", color::header("ID"), color::header("NAME"), color::header("STATUS"));
    for project in projects {
        println!("{}  {}  {}", project.project_id.as_str(), project.name, project.status);
    }
    Ok(())
}

fn handle_migrate(db: &Database, command: MigrateCommand) -> Result<(), ExitError> {
    match command {
        MigrateCommand::Check { id, all } => handle_migrate_check(db, id, all),
        MigrateCommand::ToMultiRepo { id, dry_run, workspace_root } => {
            handle_migrate_to_multi_repo(db, &id, dry_run, workspace_root)
        }
        MigrateCommand::ListRepos { id } => handle_migrate_list_repos(db, &id),
    }
}

fn handle_migrate_check(db: &Database, id: Option<String>, all: bool) -> Result<(), ExitError> {
    if !all && id.is_none() {
        return Err(ExitError::user("project migrate check requires <id> or --all"));
    }
    let project_ids: Vec<String> = if all {
        substrate_storage::list_projects(db)
            .map_err(|e| ExitError::user(e.to_string()))?
            .into_iter()
            .map(|p| p.project_id.as_str().to_string())
            .collect()
    } else {
        vec![id.expect("checked above")]
    };

    for project_id in project_ids {
        let check = substrate_storage::migrate_check(db, &project_id).map_err(|e| ExitError::user(e.to_string()))?;
        println!(
            "{}: {} repo(s), {}",
            check.project_id,
            check.repo_count,
            if check.ready { "ready for multi-repo" } else { "needs migration" }
        );
    }
    Ok(())
}

fn handle_migrate_to_multi_repo(
    db: &Database,
    id: &str,
    dry_run: bool,
    workspace_root: Option<PathBuf>) -> Result<(), ExitError> {
    let result = substrate_storage::migrate_to_multi_repo(db, id, dry_run, workspace_root.as_ref())
        .map_err(|e| ExitError::user(e.to_string()))?;
    match result.created_repo {
        Some(repo) if result.dry_run => {
            println!("would create repo {} ({})", repo.name, repo.workspace_relpath.display())
        }
        Some(repo) => println!("created repo {} ({})", repo.name, repo.workspace_relpath.display()),
        None => println!("project {id} already has registered repos; nothing to do"),
    }
    Ok(())
}

fn handle_migrate_list_repos(db: &Database, id: &str) -> Result<(), ExitError> {
    let repos = substrate_storage::list_repos(db, id).map_err(|e| ExitError::user(e.to_string()))?;
    if repos.is_empty() {
        println!("No repos registered for {id}");
        return Ok(());
    }
    for repo in repos {
        println!(
            "{}  {}  {}  writable={}",
            repo.repo_id.as_str(),
            repo.name,
            repo.workspace_relpath.display(),
            repo.is_writable
        );
    }
    Ok(())
}

/// Merges every task's replay timeline under a project into one ordered
/// view. Replay itself is only defined at task granularity; this flattens
/// across tasks for the project-level CLI contract.
fn handle_trace(db: &Database, project_id: &str, format: OutputFormat, limit: Option<usize>) -> Result<(), ExitError> {
    substrate_storage::get_project(db, project_id).map_err(|e| ExitError::user(e.to_string()))?;
    let task_ids = substrate_storage::list_for_project(db, project_id).map_err(|e| ExitError::user(e.to_string()))?;

    let mut entries: Vec<(String, substrate_core::TimelineEntry)> = Vec::new();
    for task_id in &task_ids {
        let replay = substrate_storage::replay(db, task_id).map_err(|e| ExitError::user(e.to_string()))?;
        entries.extend(replay.timeline.into_iter().map(|entry| (task_id.clone(), entry)));
    }
    entries.sort_by(|a, b| a.1.created_at.cmp(&b.1.created_at).then(a.1.source_order.cmp(&b.1.source_order)));
    if let Some(limit) = limit {
        entries.truncate(limit);
    }

    match format {
        OutputFormat::Json => {
            let rows: Vec<_> = entries
                .iter()
                .map(|(task_id, e)| serde_json::json!({"task_id": task_id, "created_at": e.created_at, "summary": e.summary}))
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows).map_err(|e| ExitError::user(e.to_string()))?);
        }
        OutputFormat::Tree => {
            for task_id in &task_ids {
                println!("{}", color::header(task_id));
                for (entry_task, entry) in &entries {
                    if entry_task == task_id {
                        println!("  {} {}", entry.created_at, entry.summary);
                    }
                }
            }
        }
        OutputFormat::Table => {
            println!("{}  {}  {}", color::header("TASK"), color::header("AT"), color::header("EVENT"));
            for (task_id, entry) in &entries {
                println!("{}  {}  {}", task_id, entry.created_at, entry.summary);
            }
        }
    }
    Ok(())
}
