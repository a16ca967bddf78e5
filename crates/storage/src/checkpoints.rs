// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

//! Checkpoint Engine.
//!
//! Two-phase lifecycle: `begin_step` buffers a pending step in memory only
//! (never persisted); `commit_step` is what actually writes a row, assigning
//! `sequence_number` inside the same write closure that inserts it, the same
//! pattern the lock manager uses for atomic check-then-act.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use rusqlite::{params, OptionalExtension};
use serde_json::Value as Json;
use substrate_core::{Checkpoint, CheckpointId, EvidencePack, SubstrateError, SubstrateResult};

use crate::audit;
use crate::db::Database;
use crate::evidence;

/// A step begun but not yet committed. Lives only in process memory — if the
/// process dies before `commit_step`, the step is simply lost.
struct PendingStep {
    task_id: String,
    checkpoint_type: String,
    work_item_id: Option<String>,
    snapshot_data: HashMap<String, Json>,
    metadata: HashMap<String, Json>,
}

static PENDING: OnceLock<Mutex<HashMap<String, PendingStep>>> = OnceLock::new();

fn pending() -> &'static Mutex<HashMap<String, PendingStep>> {
    PENDING.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Buffer a pending step and emit a `checkpoint_begin` event. Returns an
/// opaque `step_id`, unique per process, to be passed to [`commit_step`].
pub fn begin_step(
    db: &Database,
    task_id: &str,
    checkpoint_type: &str,
    snapshot: HashMap<String, Json>,
    work_item_id: Option<String>,
    metadata: Option<HashMap<String, Json>>,
    now: i64) -> SubstrateResult<String> {
    let step_id = format!("step-{}", nanoid::nanoid!(16));
    let metadata = metadata.unwrap_or_default();

    pending().lock().unwrap_or_else(|e| e.into_inner()).insert(
        step_id.clone(),
        PendingStep {
            task_id: task_id.to_string(),
            checkpoint_type: checkpoint_type.to_string(),
            work_item_id,
            snapshot_data: snapshot,
            metadata,
        });

    audit::record_event(db, task_id, "checkpoint_begin", &HashMap::new(), now)?;
    Ok(step_id)
}

/// Persist the pending step as a new checkpoint row, auto-verifying by
/// default. `sequence_number` is `max(sequence_number) + 1` over all rows
/// for this task, computed inside the same write closure that inserts the
/// row.
pub fn commit_step(
    db: &Database,
    step_id: &str,
    evidence_pack: EvidencePack,
    checkpoint_id: Option<CheckpointId>,
    base_path: &std::path::Path,
    auto_verify: bool,
    now: i64) -> SubstrateResult<Checkpoint> {
    let step = pending()
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .remove(step_id)
        .ok_or_else(|| SubstrateError::Checkpoint(format!("unknown step_id {step_id}")))?;

    let mut evidence_pack = evidence_pack;
    if auto_verify {
        evidence::verify_pack(&mut evidence_pack, base_path);
    }
    let verified = evidence_pack.passes();
    let last_verified_at = if auto_verify { Some(now) } else { None };

    let checkpoint_id = checkpoint_id.unwrap_or_else(CheckpointId::new);
    let snapshot_json = serde_json::to_string(&step.snapshot_data)?;
    let evidence_json = serde_json::to_string(&evidence_pack)?;
    let metadata_json = serde_json::to_string(&step.metadata)?;

    let task_id = step.task_id.clone();
    let checkpoint_type = step.checkpoint_type.clone();
    let work_item_id = step.work_item_id.clone();
    let checkpoint_id_str = checkpoint_id.as_str().to_string();

    let sequence_number: i64 = db.write({
        let task_id = task_id.clone();
        let checkpoint_id_str = checkpoint_id_str.clone();
        let checkpoint_type = checkpoint_type.clone();
        let work_item_id = work_item_id.clone();
        let snapshot_json = snapshot_json.clone();
        let evidence_json = evidence_json.clone();
        let metadata_json = metadata_json.clone();
        move |conn| {
            let next_seq: i64 = conn.query_row(
                "SELECT COALESCE(MAX(sequence_number), 0) + 1 FROM checkpoints WHERE task_id = ?1",
                params![task_id],
                |row| row.get(0))?;
            conn.execute(
                "INSERT INTO checkpoints
                    (checkpoint_id, task_id, work_item_id, checkpoint_type, sequence_number,
                     snapshot_data, evidence_pack, verified, last_verified_at, metadata, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    checkpoint_id_str,
                    task_id,
                    work_item_id,
                    checkpoint_type,
                    next_seq,
                    snapshot_json,
                    evidence_json,
                    verified,
                    last_verified_at,
                    metadata_json,
                    now,
                ])?;
            Ok(next_seq)
        }
    })?;

    audit::record_event(db, &task_id, "checkpoint_commit", &HashMap::new(), now)?;

    Ok(Checkpoint {
        checkpoint_id,
        task_id: substrate_core::task::TaskId::from_string(&task_id),
        work_item_id,
        checkpoint_type,
        sequence_number,
        snapshot_data: step.snapshot_data,
        evidence_pack,
        verified,
        last_verified_at,
        metadata: step.metadata,
        created_at: now,
    })
}

pub fn get_checkpoint(db: &Database, checkpoint_id: &str) -> SubstrateResult<Checkpoint> {
    let checkpoint_id = checkpoint_id.to_string();
    db.read(move |conn| {
        conn.query_row(
            "SELECT checkpoint_id, task_id, work_item_id, checkpoint_type, sequence_number,
                    snapshot_data, evidence_pack, verified, last_verified_at, metadata, created_at
             FROM checkpoints WHERE checkpoint_id = ?1",
            params![checkpoint_id],
            row_to_checkpoint)
        .optional()?
        .ok_or_else(|| SubstrateError::NotFound(format!("checkpoint {checkpoint_id}")))
    })
}

pub fn list_checkpoints(
    db: &Database,
    task_id: &str,
    limit: i64,
    checkpoint_type: Option<&str>) -> SubstrateResult<Vec<Checkpoint>> {
    let task_id = task_id.to_string();
    let checkpoint_type = checkpoint_type.map(str::to_string);
    db.read(move |conn| {
        let mut stmt = conn.prepare(
            "SELECT checkpoint_id, task_id, work_item_id, checkpoint_type, sequence_number,
                    snapshot_data, evidence_pack, verified, last_verified_at, metadata, created_at
             FROM checkpoints
             WHERE task_id = ?1 AND (?2 IS NULL OR checkpoint_type = ?2)
             ORDER BY sequence_number DESC
             LIMIT ?3")?;
        let rows = stmt
            .query_map(params![task_id, checkpoint_type, limit], row_to_checkpoint)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Newest row whose stored `verified` flag is true and whose evidence pack
/// still satisfies its pass policy right now.
pub fn get_last_verified_checkpoint(
    db: &Database,
    task_id: &str,
    checkpoint_type: Option<&str>) -> SubstrateResult<Option<Checkpoint>> {
    let candidates = list_checkpoints(db, task_id, i64::MAX, checkpoint_type)?;
    Ok(candidates.into_iter().find(|c| c.verified && c.evidence_pack.passes()))
}

/// Always re-verify against live state and return the stored snapshot data
/// on success. Performs no filesystem mutation — the caller restores state
/// from the returned snapshot. A checkpoint verified at commit time can
/// still have had its artifacts removed since, so rollback never trusts the
/// stored `verified` flag.
pub fn rollback_to_checkpoint(
    db: &Database,
    checkpoint_id: &str,
    base_path: &std::path::Path,
    now: i64) -> SubstrateResult<HashMap<String, Json>> {
    let mut checkpoint = get_checkpoint(db, checkpoint_id)?;
    evidence::verify_pack(&mut checkpoint.evidence_pack, base_path);
    let verified = checkpoint.evidence_pack.passes();
    let evidence_json = serde_json::to_string(&checkpoint.evidence_pack)?;
    let id = checkpoint.checkpoint_id.as_str().to_string();
    db.write({
        let id = id.clone();
        let evidence_json = evidence_json.clone();
        move |conn| {
            Ok(conn.execute(
                "UPDATE checkpoints SET verified = ?1, last_verified_at = ?2, evidence_pack = ?3 WHERE checkpoint_id = ?4",
                params![verified, now, evidence_json, id])?)
        }
    })?;
    checkpoint.verified = verified;
    checkpoint.last_verified_at = Some(now);
    if !verified {
        return Err(SubstrateError::Checkpoint(format!(
            "checkpoint {checkpoint_id} failed re-verification"
        )));
    }
    Ok(checkpoint.snapshot_data)
}

fn row_to_checkpoint(row: &rusqlite::Row) -> rusqlite::Result<Checkpoint> {
    let checkpoint_id_str: String = row.get(0)?;
    let task_id_str: String = row.get(1)?;
    let snapshot_json: String = row.get(5)?;
    let evidence_json: String = row.get(6)?;
    let metadata_json: String = row.get(9)?;

    Ok(Checkpoint {
        checkpoint_id: CheckpointId::from_string(&checkpoint_id_str),
        task_id: substrate_core::task::TaskId::from_string(&task_id_str),
        work_item_id: row.get(2)?,
        checkpoint_type: row.get(3)?,
        sequence_number: row.get(4)?,
        snapshot_data: serde_json::from_str(&snapshot_json).unwrap_or_default(),
        evidence_pack: serde_json::from_str(&evidence_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
        })?,
        verified: row.get(7)?,
        last_verified_at: row.get(8)?,
        metadata: serde_json::from_str(&metadata_json).unwrap_or_default(),
        created_at: row.get(10)?,
    })
}

#[cfg(test)]
#[path = "checkpoints_tests.rs"]
mod tests;
