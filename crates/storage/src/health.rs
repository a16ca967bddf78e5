// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

//! Health Check. Runs at process start, before
//! anything accepts work.

use substrate_core::{CheckResult, HealthMode, HealthReport, SubstrateResult};

use crate::conn::{busy_timeout_ms, effective_busy_timeout, is_wal_mode};
use crate::db::Database;
use crate::migrations::current_version;
use crate::schema::{MIN_SCHEMA_VERSION, REQUIRED_TABLES};

/// Run every check against `db` and assemble a report under `mode`. Never
/// fails: a check that cannot run records itself as a failed [`CheckResult`]
/// rather than propagating an error, so the suite always finishes.
pub fn check(db: &Database, mode: HealthMode) -> HealthReport {
    let mut checks = Vec::new();
    checks.push(file_exists(db));
    checks.push(opens_and_queries(db));
    checks.push(wal_mode(db));
    checks.push(busy_timeout(db));
    checks.push(schema_version(db));
    checks.push(required_tables(db));
    HealthReport { mode, checks }
}

fn named(name: &str, result: SubstrateResult<CheckResult>) -> CheckResult {
    match result {
        Ok(check) => check,
        Err(err) => CheckResult { name: name.to_string(), passed: false, detail: Some(err.to_string()) },
    }
}

fn file_exists(db: &Database) -> CheckResult {
    let passed = db.path().is_file();
    CheckResult {
        name: "db_file_exists".to_string(),
        passed,
        detail: (!passed).then(|| format!("{} not found", db.path().display())),
    }
}

fn opens_and_queries(db: &Database) -> CheckResult {
    named(
        "opens_and_queries",
        db.read(|conn| {
            let _: i64 = conn.query_row("SELECT 1", [], |row| row.get(0))?;
            Ok(CheckResult { name: "opens_and_queries".to_string(), passed: true, detail: None })
        }))
}

fn wal_mode(db: &Database) -> CheckResult {
    named(
        "wal_mode",
        db.read(|conn| {
            let ok = is_wal_mode(conn)?;
            Ok(CheckResult {
                name: "wal_mode".to_string(),
                passed: ok,
                detail: (!ok).then(|| "PRAGMA journal_mode is not WAL".to_string()),
            })
        }))
}

fn busy_timeout(db: &Database) -> CheckResult {
    named(
        "busy_timeout",
        db.read(|conn| {
            let actual = effective_busy_timeout(conn)?;
            let required = busy_timeout_ms() as i64;
            let ok = actual >= required.min(5_000);
            Ok(CheckResult {
                name: "busy_timeout".to_string(),
                passed: ok,
                detail: (!ok).then(|| format!("busy_timeout={actual}ms below required 5000ms")),
            })
        }))
}

fn schema_version(db: &Database) -> CheckResult {
    named("schema_version", {
        current_version(db).map(|version| {
            let ok = version >= MIN_SCHEMA_VERSION;
            CheckResult {
                name: "schema_version".to_string(),
                passed: ok,
                detail: (!ok).then(|| format!("schema version {version} below minimum {MIN_SCHEMA_VERSION}")),
            }
        })
    })
}

fn required_tables(db: &Database) -> CheckResult {
    named(
        "required_tables",
        db.read(|conn| {
            let mut missing = Vec::new();
            for table in REQUIRED_TABLES {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0))?;
                if count == 0 {
                    missing.push(*table);
                }
            }
            Ok(CheckResult {
                name: "required_tables".to_string(),
                passed: missing.is_empty(),
                detail: (!missing.is_empty()).then(|| format!("missing tables: {}", missing.join(", "))),
            })
        }))
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
