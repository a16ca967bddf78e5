// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

use super::*;
use std::collections::HashMap;
use substrate_core::AuditLevel;
use tempfile::tempdir;

fn seed_task(db: &Database, task_id: &str) {
    db.write({
        let task_id = task_id.to_string();
        move |conn| {
            Ok(conn.execute(
                "INSERT INTO tasks (task_id, title, status, created_at, updated_at) VALUES (?1, 'T', 'queued', 0, 0)",
                rusqlite::params![task_id])?)
        }
    })
    .expect("seed task");
}

#[test]
fn timeline_sorts_by_created_at_then_source_order() {
    let dir = tempdir().expect("tempdir");
    let db = Database::open_at(&dir.path().join("db.sqlite")).expect("open db");
    seed_task(&db, "T1");

    audit::record_transition(&db, "T1", "queued", "running", "scheduler", None, &HashMap::new(), 1_000).expect("transition");
    audit::record_event(&db, "T1", "checkpoint_begin", &HashMap::new(), 1_000).expect("event at same time");
    audit::record_audit(&db, "T1", AuditLevel::Info, "note", &HashMap::new(), 1_000).expect("audit at same time");
    audit::record_event(&db, "T1", "checkpoint_commit", &HashMap::new(), 999).expect("earlier event");

    let result = replay(&db, "T1").expect("replay");
    assert_eq!(result.timeline.len(), 4);
    assert_eq!(result.timeline[0].source, TimelineSource::Event);
    assert_eq!(result.timeline[0].created_at, 999);
    assert_eq!(result.timeline[1].source, TimelineSource::Transition);
    assert_eq!(result.timeline[2].source, TimelineSource::Event);
    assert_eq!(result.timeline[3].source, TimelineSource::Audit);
}

#[test]
fn summary_counts_and_status_sequence_match() {
    let dir = tempdir().expect("tempdir");
    let db = Database::open_at(&dir.path().join("db.sqlite")).expect("open db");
    seed_task(&db, "T1");

    audit::record_transition(&db, "T1", "queued", "waiting_lock", "scheduler", None, &HashMap::new(), 1_000).expect("t1");
    audit::record_transition(&db, "T1", "waiting_lock", "running", "scheduler", None, &HashMap::new(), 1_010).expect("t2");

    let result = replay(&db, "T1").expect("replay");
    assert_eq!(result.summary.transition_count, 2);
    assert_eq!(result.summary.event_count, 0);
    assert_eq!(result.summary.audit_count, 0);
    assert_eq!(result.summary.status_sequence, vec!["waiting_lock".to_string(), "running".to_string()]);
    assert_eq!(result.summary.duration_ms, Some(10));
}
