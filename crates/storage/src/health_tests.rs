// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

use super::*;
use substrate_core::HealthMode;
use tempfile::tempdir;

#[test]
fn fresh_database_passes_every_check_in_strict_mode() {
    let dir = tempdir().expect("tempdir");
    let db = Database::open_at(&dir.path().join("db.sqlite")).expect("open db");
    let report = check(&db, HealthMode::Strict);
    assert!(report.all_passed(), "{:?}", report.failed().collect::<Vec<_>>());
    assert!(!report.should_abort());
}

#[test]
fn missing_required_table_fails_and_aborts_in_strict_mode() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("db.sqlite");
    let db = Database::open_at(&path).expect("open db");
    db.write(|conn| Ok(conn.execute_batch("DROP TABLE commit_links")?)).expect("drop table");

    let strict_report = check(&db, HealthMode::Strict);
    assert!(!strict_report.all_passed());
    assert!(strict_report.should_abort());

    let safe_report = check(&db, HealthMode::Safe);
    assert!(!safe_report.should_abort());
    assert!(safe_report.should_degrade());

    let dev_report = check(&db, HealthMode::Dev);
    assert!(!dev_report.should_abort());
    assert!(!dev_report.should_degrade());
}
