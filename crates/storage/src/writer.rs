// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

//! Write Serializer.
//!
//! One background thread per database file owns the writable connection.
//! Callers submit closures; the worker wraps each in `BEGIN IMMEDIATE` /
//! `COMMIT`, retrying on `SQLITE_BUSY`/`SQLITE_LOCKED` with exponential
//! backoff, and delivers the result through a one-shot channel.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, OnceLock};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rusqlite::{Connection, ErrorCode};
use substrate_core::{SubstrateError, SubstrateResult};

use crate::conn::open_configured;

const INITIAL_DELAY: Duration = Duration::from_millis(20);
const MAX_DELAY: Duration = Duration::from_millis(500);
const MAX_ATTEMPTS: u32 = 8;
const WARN_QUEUE_DEPTH: usize = 50;
const ERROR_QUEUE_DEPTH: usize = 100;

/// Rolling metrics exposed by a [`WriteSerializer`].
#[derive(Debug, Clone, Default)]
pub struct WriterMetrics {
    pub queue_depth: usize,
    pub high_water_mark: usize,
    pub total_writes: u64,
    pub total_retries: u64,
    pub failed_writes: u64,
    pub total_write_time: Duration,
}

impl WriterMetrics {
 /// Writes per second since the metrics were last reset conceptually;
 /// computed from cumulative write time rather than wall-clock uptime so
 /// it reflects throughput while busy, not idle time between jobs.
    pub fn throughput(&self) -> f64 {
        if self.total_write_time.is_zero() {
            return 0.0;
        }
        self.total_writes as f64 / self.total_write_time.as_secs_f64()
    }
}

type Job = Box<dyn FnOnce(&Connection) + Send>;

enum QueueEntry {
    Work(Job),
    Shutdown,
}

struct Shared {
    metrics: Mutex<WriterMetrics>,
}

/// Single-writer serializer for one database path. Construct via
/// [`WriteSerializer::for_path`]; never directly.
pub struct WriteSerializer {
    path: PathBuf,
    sender: Sender<QueueEntry>,
    shared: Arc<Shared>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

static REGISTRY: OnceLock<Mutex<HashMap<PathBuf, Arc<WriteSerializer>>>> = OnceLock::new();

fn registry() -> &'static Mutex<HashMap<PathBuf, Arc<WriteSerializer>>> {
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

impl WriteSerializer {
 /// Get-or-insert the serializer for `path`. Deduplicated by canonicalized
 /// path so two relative spellings of the same file share one worker.
    pub fn for_path(path: &Path) -> SubstrateResult<Arc<WriteSerializer>> {
        let key = canonical_key(path);
        let mut reg = registry().lock();
        if let Some(existing) = reg.get(&key) {
            return Ok(Arc::clone(existing));
        }
        let serializer = Arc::new(Self::spawn(path.to_path_buf())?);
        reg.insert(key, Arc::clone(&serializer));
        Ok(serializer)
    }

    fn spawn(path: PathBuf) -> SubstrateResult<WriteSerializer> {
        let (tx, rx): (Sender<QueueEntry>, Receiver<QueueEntry>) = mpsc::channel();
        let shared = Arc::new(Shared { metrics: Mutex::new(WriterMetrics::default()) });
        let worker_shared = Arc::clone(&shared);
        let worker_path = path.clone();
        let conn = open_configured(&path)?;
        let handle = std::thread::Builder::new()
            .name(format!("substrate-writer-{}", path.display()))
            .spawn(move || run_worker(conn, rx, worker_shared, worker_path))?;
        Ok(WriteSerializer { path, sender: tx, shared, handle: Mutex::new(Some(handle)) })
    }

 /// Submit a write closure with a timeout. The closure runs under `BEGIN
 /// IMMEDIATE` with busy/locked retry; everything else propagates after a
 /// rollback.
    pub fn submit<F, R>(&self, timeout: Duration, f: F) -> SubstrateResult<R>
    where
        F: Fn(&Connection) -> SubstrateResult<R> + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<SubstrateResult<R>>();
        let shared = Arc::clone(&self.shared);
        let job: Job = Box::new(move |conn| {
            let start = Instant::now();
            let (result, retries) = execute_with_retry(conn, f);
            let mut metrics = shared.metrics.lock();
            metrics.total_retries += retries;
            metrics.total_write_time += start.elapsed();
            match &result {
                Ok(_) => metrics.total_writes += 1,
                Err(_) => metrics.failed_writes += 1,
            }
            drop(metrics);
            let _ = tx.send(result);
        });
        self.observe_enqueue();
        self.sender
            .send(QueueEntry::Work(job))
            .map_err(|_| SubstrateError::SerializerShutdown(self.path.display().to_string()))?;
        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(_) => Err(SubstrateError::Timeout(timeout)),
        }
    }

    fn observe_enqueue(&self) {
        let mut metrics = self.shared.metrics.lock();
        metrics.queue_depth += 1;
        if metrics.queue_depth > metrics.high_water_mark {
            metrics.high_water_mark = metrics.queue_depth;
        }
        if metrics.queue_depth > ERROR_QUEUE_DEPTH {
            tracing::error!(path = %self.path.display(), depth = metrics.queue_depth, "write queue depth critical");
        } else if metrics.queue_depth > WARN_QUEUE_DEPTH {
            tracing::warn!(path = %self.path.display(), depth = metrics.queue_depth, "write queue depth elevated");
        }
    }

    pub fn metrics(&self) -> WriterMetrics {
        self.shared.metrics.lock().clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

 /// Best-effort shutdown: enqueues the sentinel and joins the thread.
 /// Close errors inside the worker are logged, never raised.
    pub fn shutdown(&self) {
        let _ = self.sender.send(QueueEntry::Shutdown);
        if let Some(handle) = self.handle.lock().take() {
            let _ = handle.join();
        }
    }
}

/// Shut down and forget every serializer in the process registry. Intended
/// for test teardown and graceful process exit.
pub fn stop_all() {
    let mut reg = registry().lock();
    for (_, serializer) in reg.drain() {
        serializer.shutdown();
    }
}

fn canonical_key(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

fn run_worker(conn: Connection, rx: Receiver<QueueEntry>, shared: Arc<Shared>, path: PathBuf) {
    loop {
        match rx.recv() {
            Ok(QueueEntry::Work(job)) => {
                {
                    let mut metrics = shared.metrics.lock();
                    metrics.queue_depth = metrics.queue_depth.saturating_sub(1);
                }
                job(&conn);
            }
            Ok(QueueEntry::Shutdown) | Err(_) => break,
        }
    }
    if let Err(err) = conn.execute_batch("PRAGMA optimize") {
        tracing::warn!(path = %path.display(), error = %err, "error tidying writer connection on shutdown");
    }
}

fn execute_with_retry<F, R>(conn: &Connection, f: F) -> (SubstrateResult<R>, u64)
where
    F: Fn(&Connection) -> SubstrateResult<R>,
{
    let mut delay = INITIAL_DELAY;
    let mut attempt: u32 = 0;
    let mut retries: u64 = 0;
    loop {
        attempt += 1;
        if let Err(err) = conn.execute_batch("BEGIN IMMEDIATE") {
            if is_sqlite_retryable(&err) && attempt < MAX_ATTEMPTS {
                retries += 1;
                std::thread::sleep(delay);
                delay = std::cmp::min(delay * 2, MAX_DELAY);
                continue;
            }
            return (Err(err.into()), retries);
        }
        match f(conn) {
            Ok(value) => {
                if let Err(err) = conn.execute_batch("COMMIT") {
                    let _ = conn.execute_batch("ROLLBACK");
                    return (Err(err.into()), retries);
                }
                return (Ok(value), retries);
            }
            Err(err) => {
                let _ = conn.execute_batch("ROLLBACK");
                if is_retryable(&err) && attempt < MAX_ATTEMPTS {
                    retries += 1;
                    std::thread::sleep(delay);
                    delay = std::cmp::min(delay * 2, MAX_DELAY);
                    continue;
                }
                return (Err(err), retries);
            }
        }
    }
}

fn is_sqlite_retryable(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked))
}

fn is_retryable(err: &SubstrateError) -> bool {
    match err {
        SubstrateError::Sql(rusqlite::Error::SqliteFailure(e, _)) => {
            matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
        }
        _ => false,
    }
}
