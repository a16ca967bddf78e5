// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

//! Path Registry.
//!
//! Holds the process-wide convention of one database file per named
//! component under `~/.agent-substrate/store/<component>/db.sqlite`. The
//! component set is closed; callers that ask for an unregistered name fail
//! fast rather than silently creating a new store.

use std::path::{Path, PathBuf};

use substrate_core::{SubstrateError, SubstrateResult};

use crate::conn::open_configured;

/// Components the substrate knows how to host. Extend this list, and only
/// this list, to add a new database file.
pub const KNOWN_COMPONENTS: &[&str] = &["agentos", "memoryos", "networkos", "kb"];

pub fn is_known_component(component: &str) -> bool {
    KNOWN_COMPONENTS.contains(&component)
}

/// The per-user home directory all component stores live under.
///
/// Honors `AGENTOS_HOME` for tests and containerized deployments; falls back
/// to `$HOME/.agent-substrate`.
pub fn substrate_home() -> SubstrateResult<PathBuf> {
    if let Ok(dir) = std::env::var("AGENTOS_HOME") {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs_home()?;
    Ok(home.join(".agent-substrate"))
}

fn dirs_home() -> SubstrateResult<PathBuf> {
    std::env::var("HOME")
        .map(PathBuf::from)
        .map_err(|_| SubstrateError::NotFound("HOME environment variable not set".to_string()))
}

/// Path to a component's database file, without creating anything.
pub fn db_path(component: &str) -> SubstrateResult<PathBuf> {
    if !is_known_component(component) {
        return Err(SubstrateError::NotFound(format!("unknown component: {component}")));
    }
    if let Ok(over) = std::env::var("AGENTOS_DB_PATH") {
        if component == "agentos" {
            return Ok(PathBuf::from(over));
        }
    } else if let Ok(over) = std::env::var("SQLITE_PATH") {
        if component == "agentos" {
            return Ok(PathBuf::from(over));
        }
    }
    Ok(substrate_home()?.join("store").join(component).join("db.sqlite"))
}

/// Ensure a component's database directory and file exist, opening once with
/// WAL-mode PRAGMAs applied so the file is left in a consistent state even if
/// no migration runs afterward. Idempotent: calling twice is a no-op on the
/// second call beyond re-applying PRAGMAs.
pub fn ensure_db(component: &str) -> SubstrateResult<PathBuf> {
    let path = db_path(component)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = open_configured(&path)?;
    drop(conn);
    Ok(path)
}

/// True if `path` is an existing, non-empty file — used by health checks
/// before attempting a real connection.
pub fn db_file_present(path: &Path) -> bool {
    path.is_file()
}
