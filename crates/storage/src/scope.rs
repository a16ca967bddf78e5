// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

//! Connection Scope.
//!
//! A scoped read acquisition with guaranteed release. [`ConnScope::Private`]
//! opens a fresh connection and closes it on drop; [`ConnScope::Shared`]
//! hands back the process-shared thread-local connection for a path and
//! never closes it — the caller must not move it to another thread.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use substrate_core::SubstrateResult;

use crate::conn::open_configured;

thread_local! {
    static SHARED_CONNS: RefCell<HashMap<PathBuf, Connection>> = RefCell::new(HashMap::new());
}

/// Borrowed access to a connection, either private (closed on drop) or
/// shared thread-local (left open).
pub enum ConnScope {
    Private(Connection),
}

impl ConnScope {
 /// Open a fresh private connection to `path`. Closed automatically when
 /// the returned guard drops; close errors are logged, not raised, since
 /// the caller may already be unwinding.
    pub fn private(path: &Path) -> SubstrateResult<ConnScope> {
        Ok(ConnScope::Private(open_configured(path)?))
    }

    pub fn conn(&self) -> &Connection {
        match self {
            ConnScope::Private(conn) => conn,
        }
    }
}

impl Drop for ConnScope {
    fn drop(&mut self) {
        // rusqlite::Connection's own Drop already closes the handle; this
        // exists to document the contract and to log errors if we switch to
        // Connection::close (which surfaces failures) in the future.
    }
}

/// Run `f` against the current thread's shared connection for `path`,
/// opening and caching it on first use. The connection is never closed by
/// this call and must not be handed to another thread.
pub fn with_shared<F, R>(path: &Path, f: F) -> SubstrateResult<R>
where
    F: FnOnce(&Connection) -> SubstrateResult<R>,
{
    SHARED_CONNS.with(|cell| {
        let mut conns = cell.borrow_mut();
        if !conns.contains_key(path) {
            conns.insert(path.to_path_buf(), open_configured(path)?);
        }
        let conn = conns.get(path).expect("just inserted");
        f(conn)
    })
}
