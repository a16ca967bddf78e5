// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

//! Top-level handle a caller opens once per component: wires together the
//! path registry, write serializer, connection scope, and migration runner.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::Connection;
use substrate_core::SubstrateResult;

use crate::migrations::run_migrations;
use crate::paths;
use crate::scope::ConnScope;
use crate::writer::{WriteSerializer, WriterMetrics};
use std::sync::Arc;

const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct Database {
    path: PathBuf,
    writer: Arc<WriteSerializer>,
}

impl Database {
 /// Open (creating if necessary) and migrate the database for a known
 /// component.
    pub fn open(component: &str) -> SubstrateResult<Database> {
        let path = paths::ensure_db(component)?;
        Self::open_at(&path)
    }

 /// Open (creating if necessary) and migrate an arbitrary path. Used by
 /// tests and by callers managing their own component namespace.
    pub fn open_at(path: &Path) -> SubstrateResult<Database> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let writer = WriteSerializer::for_path(path)?;
        let db = Database { path: path.to_path_buf(), writer };
        run_migrations(&db)?;
        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn metrics(&self) -> WriterMetrics {
        self.writer.metrics()
    }

 /// Submit a write closure to this database's serializer with the default
 /// write timeout.
    pub fn write<F, R>(&self, f: F) -> SubstrateResult<R>
    where
        F: Fn(&Connection) -> SubstrateResult<R> + Send + 'static,
        R: Send + 'static,
    {
        self.writer.submit(DEFAULT_WRITE_TIMEOUT, f)
    }

 /// Submit a write closure with an explicit timeout.
    pub fn write_with_timeout<F, R>(&self, timeout: Duration, f: F) -> SubstrateResult<R>
    where
        F: Fn(&Connection) -> SubstrateResult<R> + Send + 'static,
        R: Send + 'static,
    {
        self.writer.submit(timeout, f)
    }

 /// Run `f` against a fresh private read connection.
    pub fn read<F, R>(&self, f: F) -> SubstrateResult<R>
    where
        F: FnOnce(&Connection) -> SubstrateResult<R>,
    {
        let scope = ConnScope::private(&self.path)?;
        f(scope.conn())
    }
}
