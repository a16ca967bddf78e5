// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

//! Ordered DDL scripts applied by the migration runner.
//!
//! Each entry is `(version, description, sql, backfill)`. Scripts never
//! change once shipped; new columns or tables are added by a new version.
//! `backfill` is `None` for pure-DDL migrations; a handful of migrations
//! also need to reshape existing rows once the new DDL is in place — those
//! carry a backfill function that runs after the DDL, inside the same
//! transaction, and returns the stats recorded in that migration's
//! `schema_version.metadata`.

use rusqlite::Connection;
use substrate_core::SubstrateResult;

pub type BackfillFn = fn(&Connection) -> SubstrateResult<serde_json::Value>;

pub const MIGRATIONS: &[(i64, &str, &str, Option<BackfillFn>)] = &[
    (1, "initial schema", include_str!("migrations/0001_initial.sql"), None),
    (2, "file_locks and checkpoints", include_str!("migrations/0002_locks_checkpoints.sql"), None),
    (3, "audit/event log and patches", include_str!("migrations/0003_audit_patches.sql"), None),
    (
        4,
        "backfill repo scope for legacy single-workspace tasks",
        include_str!("migrations/0004_backfill_legacy_repo_scope.sql"),
        Some(crate::migrations::backfill_legacy_repo_scope),
    ),
];

/// Minimum schema version this binary requires to operate.
pub const MIN_SCHEMA_VERSION: i64 = 4;

/// Tables the health check expects to exist after migration.
pub const REQUIRED_TABLES: &[&str] = &[
    "projects",
    "repos",
    "task_repo_scope",
    "tasks",
    "task_runs",
    "task_state_transitions",
    "task_events",
    "task_audits",
    "file_locks",
    "checkpoints",
    "patches",
    "commit_links",
    "schema_version",
];
