// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! substrate-storage: the durable execution substrate's storage engine.
//!
//! Wraps `substrate-core`'s types with SQLite persistence: a single-writer
//! serializer per database file, leased locks, repo scope enforcement,
//! checkpoints with evidence verification, an append-only audit trail, the
//! task lifecycle state machine, and replay.

pub mod audit;
pub mod checkpoints;
pub mod conn;
pub mod db;
pub mod evidence;
pub mod health;
pub mod locks;
pub mod migrations;
pub mod patches;
pub mod paths;
pub mod projects;
pub mod repo_scope;
pub mod replay;
pub mod scope;
pub mod schema;
pub mod tasks;
pub mod writer;

pub use checkpoints::{begin_step, commit_step, get_checkpoint, get_last_verified_checkpoint, list_checkpoints, rollback_to_checkpoint};
pub use conn::{busy_timeout_ms, effective_busy_timeout, is_wal_mode, open_configured, DEFAULT_BUSY_TIMEOUT_MS};
pub use db::Database;
pub use evidence::verify_pack;
pub use health::check as health_check;
pub use locks::{acquire_paths, acquire_task, release, renew, sweep_expired};
pub use migrations::{current_version, run_migrations};
pub use patches::{diff_hash, link_commit, list_commits_for_patch, list_commits_for_run, list_patches_for_run, record_patch};
pub use projects::{add_project, add_repo, get_project, list_projects, list_repos, migrate_check, migrate_to_multi_repo};
pub use repo_scope::{build_environment, TaskRepoContext};
pub use replay::{replay, Replay};
pub use scope::ConnScope;
pub use tasks::{get_status, list_for_project, record_resolved_settings, retry, transition};
pub use writer::{stop_all, WriteSerializer, WriterMetrics};
