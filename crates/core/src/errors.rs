// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

//! Error types shared across the execution substrate.
//!
//! Database errors bubble up as [`SubstrateError::Sql`]; everything else is a
//! named variant so callers can branch on kind without string matching.

use thiserror::Error;

/// Top-level error for the substrate crates.
#[derive(Debug, Error)]
pub enum SubstrateError {
 /// A resource (task lease or file lease) is currently held by someone else.
    #[error("lock conflict on {resource}: held by {owner}")]
    LockConflict {
        resource: String,
        owner: String,
 /// Whether retrying with backoff is meaningful.
        wait: bool,
    },

 /// A path was denied by repo containment or scope rules.
    #[error("path security error: {path} denied for repo {repo_id} (scope {scope})")]
    PathSecurity {
        path: String,
        repo_id: String,
        scope: String,
    },

 /// A checkpoint lifecycle operation failed.
    #[error("checkpoint error: {0}")]
    Checkpoint(String),

 /// Evidence verification could not be completed (malformed expected fields,
 /// unreadable resource, etc). Distinct from a verification that ran and failed.
    #[error("evidence verification error: {0}")]
    EvidenceVerification(String),

 /// A write submission did not complete within the caller's budget. The
 /// underlying write may still commit; treat the outcome as unknown.
    #[error("write submission timed out after {0:?}")]
    Timeout(std::time::Duration),

 /// Schema migration failed. Fatal at startup.
    #[error("migration error: {0}")]
    Migration(String),

 /// A health check failed. Caller decides STRICT/SAFE/DEV handling.
    #[error("health check failure: {0}")]
    HealthCheck(String),

 /// An illegal task status transition was attempted.
    #[error("illegal transition {from} -> {to} for task {task_id}")]
    IllegalTransition {
        task_id: String,
        from: String,
        to: String,
    },

 /// Generic not-found for lookups that the caller expects to exist.
    #[error("not found: {0}")]
    NotFound(String),

 /// The writer background thread was asked to submit a job after it shut down.
    #[error("write serializer for {0} has shut down")]
    SerializerShutdown(String),

    #[error(transparent)]
    Sql(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type SubstrateResult<T> = Result<T, SubstrateError>;

impl SubstrateError {
    pub fn lock_conflict(resource: impl Into<String>, owner: impl Into<String>, wait: bool) -> Self {
        SubstrateError::LockConflict { resource: resource.into(), owner: owner.into(), wait }
    }

    pub fn path_security(
        path: impl Into<String>,
        repo_id: impl Into<String>,
        scope: impl Into<String>) -> Self {
        SubstrateError::PathSecurity { path: path.into(), repo_id: repo_id.into(), scope: scope.into() }
    }

 /// True for errors that are expected, recoverable, and not worth logging at error level.
    pub fn is_lock_conflict(&self) -> bool {
        matches!(self, SubstrateError::LockConflict { .. })
    }
}
