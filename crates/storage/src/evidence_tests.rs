// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

use super::*;
use std::collections::HashMap;
use std::fs;
use substrate_core::{EvidenceExpected, EvidenceItem, EvidencePack, PassPolicy};
use tempfile::tempdir;

#[test]
fn artifact_exists_passes_for_present_file() {
    let dir = tempdir().expect("tempdir");
    fs::write(dir.path().join("a.txt"), b"hi").expect("write");
    let mut item = EvidenceItem::pending(EvidenceExpected::ArtifactExists {
        path: "a.txt".to_string(),
        kind: Some(ArtifactKind::File),
    });
    verify_item(&mut item, dir.path());
    assert!(item.verified);
}

#[test]
fn artifact_exists_fails_for_missing_file() {
    let dir = tempdir().expect("tempdir");
    let mut item =
        EvidenceItem::pending(EvidenceExpected::ArtifactExists { path: "missing.txt".to_string(), kind: None });
    verify_item(&mut item, dir.path());
    assert!(!item.verified);
    assert!(item.verification_error.is_some());
}

#[test]
fn file_sha256_matches_streamed_hash() {
    let dir = tempdir().expect("tempdir");
    fs::write(dir.path().join("a.txt"), b"hello world").expect("write");
    let expected = {
        use sha2::{Digest, Sha256};
        hex::encode(Sha256::digest(b"hello world"))
    };
    let mut item =
        EvidenceItem::pending(EvidenceExpected::FileSha256 { path: "a.txt".to_string(), sha256: expected });
    verify_item(&mut item, dir.path());
    assert!(item.verified);
}

#[test]
fn file_sha256_fails_on_mismatch() {
    let dir = tempdir().expect("tempdir");
    fs::write(dir.path().join("a.txt"), b"hello world").expect("write");
    let mut item = EvidenceItem::pending(EvidenceExpected::FileSha256 {
        path: "a.txt".to_string(),
        sha256: "0".repeat(64),
    });
    verify_item(&mut item, dir.path());
    assert!(!item.verified);
}

#[test]
fn command_exit_is_structural_only() {
    let dir = tempdir().expect("tempdir");
    let mut item = EvidenceItem::pending(EvidenceExpected::CommandExit { exit_code: 1 });
    verify_item(&mut item, dir.path());
    assert!(item.verified);
}

#[test]
fn db_row_passes_when_single_row_matches_values() {
    let dir = tempdir().expect("tempdir");
    let db_path = dir.path().join("target.sqlite");
    let db = Database::open_at(&db_path).expect("open target db");
    db.write(|conn| {
        Ok(conn.execute(
            "INSERT INTO tasks (task_id, title, status, created_at, updated_at) VALUES ('tsk-1', 'T', 'succeeded', 0, 0)",
            [])?)
    })
    .expect("seed row");

    let mut where_ = HashMap::new();
    where_.insert("task_id".to_string(), serde_json::json!("tsk-1"));
    let mut values = HashMap::new();
    values.insert("status".to_string(), serde_json::json!("succeeded"));

    let mut item = EvidenceItem::pending(EvidenceExpected::DbRow {
        table: "tasks".to_string(),
        r#where: where_,
        values,
        db_path: Some(db_path.to_string_lossy().to_string()),
    });
    verify_item(&mut item, dir.path());
    assert!(item.verified, "{:?}", item.verification_error);
}

#[test]
fn pack_round_trips_through_json_with_identical_verdict() {
    let dir = tempdir().expect("tempdir");
    fs::write(dir.path().join("a.txt"), b"hi").expect("write");
    let mut pack = EvidencePack::new(
        vec![EvidenceItem::pending(EvidenceExpected::ArtifactExists { path: "a.txt".to_string(), kind: None })],
        PassPolicy::RequireAll);
    verify_pack(&mut pack, dir.path());
    assert!(pack.passes());

    let json = serde_json::to_string(&pack).expect("serialize");
    let mut reloaded: EvidencePack = serde_json::from_str(&json).expect("deserialize");
    verify_pack(&mut reloaded, dir.path());
    assert_eq!(pack.passes(), reloaded.passes());
}
