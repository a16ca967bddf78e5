// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

//! Shared connection configuration: the PRAGMAs every opened connection
//! (writer, private reader, shared reader) must carry.

use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;
use substrate_core::SubstrateResult;

/// Default busy timeout in milliseconds, overridable by `SQLITE_BUSY_TIMEOUT`.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

pub fn busy_timeout_ms() -> u64 {
    std::env::var("SQLITE_BUSY_TIMEOUT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_BUSY_TIMEOUT_MS)
}

/// Open `path`, creating it if absent, with WAL journaling, `synchronous =
/// NORMAL`, foreign keys on, and the configured busy timeout. Every
/// connection in the process — writer or reader — goes through this.
pub fn open_configured(path: &Path) -> SubstrateResult<Connection> {
    let conn = Connection::open(path)?;
    configure(&conn)?;
    Ok(conn)
}

fn configure(conn: &Connection) -> SubstrateResult<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.busy_timeout(Duration::from_millis(busy_timeout_ms()))?;
    Ok(())
}

/// True iff `conn`'s journal mode is `wal` (case-insensitive) — used by the
/// health check.
pub fn is_wal_mode(conn: &Connection) -> SubstrateResult<bool> {
    let mode: String = conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?;
    Ok(mode.eq_ignore_ascii_case("wal"))
}

/// The effective busy timeout in milliseconds, as SQLite reports it back.
pub fn effective_busy_timeout(conn: &Connection) -> SubstrateResult<i64> {
    Ok(conn.query_row("PRAGMA busy_timeout", [], |row| row.get(0))?)
}
