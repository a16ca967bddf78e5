// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

use super::*;
use std::collections::HashMap;

crate::define_id! {
 /// Test ID type for macro verification.
    pub struct TestId("tst-");
}

#[test]
fn define_id_hash_map_lookup() {
    let id = TestId::from_string("tst-k");
    let mut map = HashMap::new();
    map.insert(id, 42);
    assert_eq!(map.get("tst-k"), Some(&42));
}

#[test]
fn define_id_round_trips_through_string() {
    let id = TestId::from_string("tst-abcdefghijklmnop");
    assert_eq!(id.as_str(), "tst-abcdefghijklmnop");
    assert_eq!(id.suffix(), "abcdefghijklmnop");
}

#[test]
fn define_id_short_truncates_suffix() {
    let id = TestId::from_string("tst-abcdefghijklmnop");
    assert_eq!(id.short(4), "abcd");
}

#[test]
fn define_id_short_returns_full_when_shorter() {
    let id = TestId::from_string("tst-ab");
    assert_eq!(id.short(8), "ab");
}

#[test]
fn define_id_new_has_type_prefix() {
    let id = TestId::new();
    assert!(id.as_str().starts_with("tst-"));
    assert_eq!(id.as_str().len(), 23);
}

#[test]
fn define_id_new_generates_unique_ids() {
    let a = TestId::new();
    let b = TestId::new();
    assert_ne!(a, b);
}

#[test]
fn define_id_serde_round_trip() {
    let id = TestId::from_string("tst-my-id");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"tst-my-id\"");
    let parsed: TestId = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, id);
}

#[test]
fn short_fn_on_str() {
    let s = "abcdefghijklmnop";
    assert_eq!(short(s, 8), "abcdefgh");
    assert_eq!(short(s, 100), s);
    assert_eq!(short("abc", 8), "abc");
}
