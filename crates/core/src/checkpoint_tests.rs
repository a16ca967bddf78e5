// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

use super::*;

fn item(verified: bool) -> EvidenceItem {
    let mut i = EvidenceItem::pending(EvidenceExpected::ArtifactExists {
        path: "a.txt".into(),
        kind: None,
    });
    i.verified = verified;
    i.verification_status = if verified { VerificationStatus::Verified } else { VerificationStatus::Failed };
    i
}

#[yare::parameterized(
    require_all_passes = { PassPolicy::RequireAll, vec![true, true], true },
    require_all_fails_on_one_miss = { PassPolicy::RequireAll, vec![true, false], false },
    allow_partial_passes_on_one = { PassPolicy::AllowPartial, vec![false, true], true },
    allow_partial_fails_on_none = { PassPolicy::AllowPartial, vec![false, false], false },
    min_verified_met = { PassPolicy::MinVerified(2), vec![true, true, false], true },
    min_verified_unmet = { PassPolicy::MinVerified(2), vec![true, false, false], false })]
fn policy_evaluation(policy: PassPolicy, verified: Vec<bool>, expect_pass: bool) {
    let items: Vec<_> = verified.into_iter().map(item).collect();
    assert_eq!(policy.evaluate(&items), expect_pass);
}

#[test]
fn empty_pack_fails_require_all_and_min_verified() {
    assert!(!PassPolicy::RequireAll.evaluate(&[]));
    assert!(!PassPolicy::MinVerified(1).evaluate(&[]));
    assert!(PassPolicy::AllowPartial.evaluate(&[]));
}

#[test]
fn pack_passes_matches_policy_evaluate() {
    let pack = EvidencePack::new(vec![item(true), item(true)], PassPolicy::RequireAll);
    assert!(pack.passes());
}

#[test]
fn kind_label_matches_expected_variant() {
    assert_eq!(
        EvidenceExpected::ArtifactExists { path: "x".into(), kind: None }.kind_label(),
        "artifact_exists"
    );
    assert_eq!(
        EvidenceExpected::CommandExit { exit_code: 0 }.kind_label(),
        "command_exit"
    );
}
