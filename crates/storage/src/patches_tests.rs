// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

use super::*;
use tempfile::tempdir;

#[test]
fn diff_hash_is_order_independent() {
    let a = diff_hash(&["b.txt".to_string(), "a.txt".to_string()]);
    let b = diff_hash(&["a.txt".to_string(), "b.txt".to_string()]);
    assert_eq!(a, b);
}

#[test]
fn record_patch_then_link_commit_round_trips() {
    let dir = tempdir().expect("tempdir");
    let db = Database::open_at(&dir.path().join("db.sqlite")).expect("open db");

    let patch = record_patch(&db, 1, None, "fix off-by-one", &["src/a.rs".to_string()], 100).expect("record patch");
    assert_eq!(patch.run_id, 1);

    let link = link_commit(&db, patch.patch_id.as_str(), "deadbeef", "fix off-by-one", "/repo", 200)
        .expect("link commit");
    assert_eq!(link.patch_id, patch.patch_id);

    let patches = list_patches_for_run(&db, 1).expect("list patches");
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].diff_hash, patch.diff_hash);

    let commits = list_commits_for_patch(&db, patch.patch_id.as_str()).expect("list commits");
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].commit_hash, "deadbeef");

    let run_commits = list_commits_for_run(&db, 1).expect("list commits for run");
    assert_eq!(run_commits.len(), 1);
}

#[test]
fn linking_the_same_patch_twice_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let db = Database::open_at(&dir.path().join("db.sqlite")).expect("open db");
    let patch = record_patch(&db, 1, None, "intent", &[], 0).expect("record patch");

    link_commit(&db, patch.patch_id.as_str(), "c1", "m1", "/repo", 1).expect("first link");
    let second = link_commit(&db, patch.patch_id.as_str(), "c2", "m2", "/repo", 2);
    assert!(second.is_err(), "commit_links.patch_id is a primary key; a second link must fail");
}
