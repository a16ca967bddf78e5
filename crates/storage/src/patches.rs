// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

//! Patch tracking. Append-only once recorded: a
//! patch records an intent over a set of paths with a deterministic diff
//! hash; a commit link ties a patch to the commit it landed in.

use rusqlite::params;
use sha2::{Digest, Sha256};
use substrate_core::{CommitLink, Patch, PatchId, SubstrateResult};

use crate::db::Database;

/// Deterministic over the declared file list: same files (any order) hash
/// the same way.
pub fn diff_hash(affected_paths: &[String]) -> String {
    let mut sorted = affected_paths.to_vec();
    sorted.sort();
    let mut hasher = Sha256::new();
    hasher.update(sorted.join("\n").as_bytes());
    hex::encode(hasher.finalize())
}

pub fn record_patch(
    db: &Database,
    run_id: i64,
    step_id: Option<&str>,
    intent: &str,
    affected_paths: &[String],
    now: i64) -> SubstrateResult<Patch> {
    let patch_id = PatchId::new();
    let hash = diff_hash(affected_paths);
    let step_id = step_id.map(str::to_string);
    let intent = intent.to_string();
    let affected_paths_json = serde_json::to_string(affected_paths)?;
    let id_str = patch_id.as_str().to_string();

    db.write({
        let id_str = id_str.clone();
        let step_id = step_id.clone();
        let intent = intent.clone();
        let hash = hash.clone();
        let affected_paths_json = affected_paths_json.clone();
        move |conn| {
            conn.execute(
                "INSERT INTO patches (patch_id, run_id, step_id, intent, affected_paths, diff_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![id_str, run_id, step_id, intent, affected_paths_json, hash, now])?;
            Ok(())
        }
    })?;

    Ok(Patch {
        patch_id,
        run_id,
        step_id,
        intent,
        affected_paths: affected_paths.to_vec(),
        diff_hash: hash,
        created_at: now,
    })
}

/// Fails on a second link for the same patch: `commit_links.patch_id` is the
/// primary key, so this is immutable-once-recorded at the schema level too.
pub fn link_commit(
    db: &Database,
    patch_id: &str,
    commit_hash: &str,
    message: &str,
    repo_root: &str,
    now: i64) -> SubstrateResult<CommitLink> {
    let patch_id_owned = patch_id.to_string();
    let commit_hash = commit_hash.to_string();
    let message = message.to_string();
    let repo_root = repo_root.to_string();

    db.write({
        let patch_id = patch_id_owned.clone();
        let commit_hash = commit_hash.clone();
        let message = message.clone();
        let repo_root = repo_root.clone();
        move |conn| {
            conn.execute(
                "INSERT INTO commit_links (patch_id, commit_hash, message, committed_at, repo_root)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![patch_id, commit_hash, message, now, repo_root])?;
            Ok(())
        }
    })?;

    Ok(CommitLink {
        patch_id: PatchId::from_string(&patch_id_owned),
        commit_hash,
        message,
        committed_at: now,
        repo_root,
    })
}

pub fn list_patches_for_run(db: &Database, run_id: i64) -> SubstrateResult<Vec<Patch>> {
    db.read(move |conn| {
        let mut stmt = conn.prepare(
            "SELECT patch_id, run_id, step_id, intent, affected_paths, diff_hash, created_at
             FROM patches WHERE run_id = ?1 ORDER BY created_at")?;
        let rows = stmt.query_map(params![run_id], row_to_patch)?.collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

pub fn list_commits_for_patch(db: &Database, patch_id: &str) -> SubstrateResult<Vec<CommitLink>> {
    let patch_id = patch_id.to_string();
    db.read(move |conn| {
        let mut stmt = conn.prepare(
            "SELECT patch_id, commit_hash, message, committed_at, repo_root
             FROM commit_links WHERE patch_id = ?1 ORDER BY committed_at")?;
        let rows = stmt.query_map(params![patch_id], row_to_commit_link)?.collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Commits for every patch belonging to a run, joined through `patches`.
pub fn list_commits_for_run(db: &Database, run_id: i64) -> SubstrateResult<Vec<CommitLink>> {
    db.read(move |conn| {
        let mut stmt = conn.prepare(
            "SELECT cl.patch_id, cl.commit_hash, cl.message, cl.committed_at, cl.repo_root
             FROM commit_links cl JOIN patches p ON cl.patch_id = p.patch_id
             WHERE p.run_id = ?1 ORDER BY cl.committed_at")?;
        let rows = stmt.query_map(params![run_id], row_to_commit_link)?.collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

fn row_to_patch(row: &rusqlite::Row) -> rusqlite::Result<Patch> {
    let patch_id_str: String = row.get(0)?;
    let affected_paths_json: String = row.get(4)?;
    Ok(Patch {
        patch_id: PatchId::from_string(&patch_id_str),
        run_id: row.get(1)?,
        step_id: row.get(2)?,
        intent: row.get(3)?,
        affected_paths: serde_json::from_str(&affected_paths_json).unwrap_or_default(),
        diff_hash: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn row_to_commit_link(row: &rusqlite::Row) -> rusqlite::Result<CommitLink> {
    let patch_id_str: String = row.get(0)?;
    Ok(CommitLink {
        patch_id: PatchId::from_string(&patch_id_str),
        commit_hash: row.get(1)?,
        message: row.get(2)?,
        committed_at: row.get(3)?,
        repo_root: row.get(4)?,
    })
}

#[cfg(test)]
#[path = "patches_tests.rs"]
mod tests;
