// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

use super::*;
use tempfile::tempdir;

fn seed_task(db: &Database, task_id: &str) {
    db.write({
        let task_id = task_id.to_string();
        move |conn| {
            Ok(conn.execute(
                "INSERT INTO tasks (task_id, title, status, created_at, updated_at) VALUES (?1, 'T', 'queued', 0, 0)",
                params![task_id])?)
        }
    })
    .expect("seed task");
}

#[test]
fn events_get_strictly_increasing_sequence_per_task() {
    let dir = tempdir().expect("tempdir");
    let db = Database::open_at(&dir.path().join("db.sqlite")).expect("open db");
    seed_task(&db, "T1");

    let seq1 = record_event(&db, "T1", "checkpoint_begin", &HashMap::new(), 1_000).expect("event 1");
    let seq2 = record_event(&db, "T1", "checkpoint_commit", &HashMap::new(), 1_001).expect("event 2");
    assert_eq!(seq1, 1);
    assert_eq!(seq2, 2);

    let events = list_events(&db, "T1").expect("list events");
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_seq, 1);
    assert_eq!(events[1].event_seq, 2);
}

#[test]
fn transitions_and_audits_round_trip() {
    let dir = tempdir().expect("tempdir");
    let db = Database::open_at(&dir.path().join("db.sqlite")).expect("open db");
    seed_task(&db, "T1");

    record_transition(&db, "T1", "queued", "running", "worker-a", Some("started"), &HashMap::new(), 1_000)
        .expect("record transition");
    record_audit(&db, "T1", AuditLevel::Warn, "retry", &HashMap::new(), 1_001).expect("record audit");

    let transitions = list_transitions(&db, "T1").expect("list transitions");
    assert_eq!(transitions.len(), 1);
    assert_eq!(transitions[0].from_status, "queued");
    assert_eq!(transitions[0].to_status, "running");

    let audits = list_audits(&db, "T1").expect("list audits");
    assert_eq!(audits.len(), 1);
    assert_eq!(audits[0].level, AuditLevel::Warn);
}
