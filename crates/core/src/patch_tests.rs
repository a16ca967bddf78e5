// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

use super::*;

fn sample_patch() -> Patch {
    Patch {
        patch_id: PatchId::new(),
        run_id: 1,
        step_id: Some("step-1".into()),
        intent: "rename function".into(),
        affected_paths: vec!["src/lib.rs".into()],
        diff_hash: "deadbeef".into(),
        created_at: 1_000_000,
    }
}

#[test]
fn patch_id_has_expected_prefix() {
    let patch = sample_patch();
    assert!(patch.patch_id.as_str().starts_with("pat-"));
}

#[test]
fn patch_round_trips_through_json() {
    let patch = sample_patch();
    let json = serde_json::to_string(&patch).expect("serialize");
    let back: Patch = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, patch);
}

#[test]
fn commit_link_round_trips_through_json() {
    let link = CommitLink {
        patch_id: PatchId::new(),
        commit_hash: "abc123".into(),
        message: "apply patch".into(),
        committed_at: 1_000_000,
        repo_root: "/repo".into(),
    };
    let json = serde_json::to_string(&link).expect("serialize");
    let back: CommitLink = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, link);
}
