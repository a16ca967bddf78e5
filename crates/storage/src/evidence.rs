// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

//! Evidence Verifier.
//!
//! Verifies one evidence item against live system state: the filesystem for
//! artifact/hash checks, the checkpoint's own recorded value for exit-code
//! checks (structural only — it does not re-run the command), and a target
//! database for row checks.

use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};
use substrate_core::{ArtifactKind, EvidenceExpected, EvidenceItem, EvidencePack, VerificationStatus};

use crate::db::Database;

const CHUNK_SIZE: usize = 4096;

/// Verify every item in `pack` against `base_path` (used to resolve relative
/// artifact/hash paths). Mutates each item's result fields in place;
/// read-only otherwise.
pub fn verify_pack(pack: &mut EvidencePack, base_path: &Path) {
    for item in &mut pack.items {
        verify_item(item, base_path);
    }
}

fn verify_item(item: &mut EvidenceItem, base_path: &Path) {
    let now = current_time();
    let outcome = match &item.expected {
        EvidenceExpected::ArtifactExists { path, kind } => verify_artifact_exists(base_path, path, *kind),
        EvidenceExpected::FileSha256 { path, sha256 } => verify_file_sha256(base_path, path, sha256),
        EvidenceExpected::CommandExit { exit_code } => verify_command_exit(*exit_code),
        EvidenceExpected::DbRow { table, r#where, values, db_path } => {
            verify_db_row(db_path.as_deref(), table, r#where, values)
        }
    };

    match outcome {
        Ok(()) => {
            item.verified = true;
            item.verification_status = VerificationStatus::Verified;
            item.verification_error = None;
        }
        Err(message) => {
            item.verified = false;
            item.verification_status = VerificationStatus::Failed;
            item.verification_error = Some(message);
        }
    }
    item.verified_at = Some(now);
}

fn verify_artifact_exists(base_path: &Path, path: &str, kind: Option<ArtifactKind>) -> Result<(), String> {
    let resolved = resolve(base_path, path);
    let metadata = std::fs::metadata(&resolved).map_err(|e| format!("artifact {path} not readable: {e}"))?;
    match kind {
        Some(ArtifactKind::File) if !metadata.is_file() => Err(format!("{path} exists but is not a file")),
        Some(ArtifactKind::Directory) if !metadata.is_dir() => Err(format!("{path} exists but is not a directory")),
        _ => Ok(()),
    }
}

fn verify_file_sha256(base_path: &Path, path: &str, expected_hex: &str) -> Result<(), String> {
    let resolved = resolve(base_path, path);
    let mut file = std::fs::File::open(&resolved).map_err(|e| format!("{path} not readable: {e}"))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf).map_err(|e| format!("{path} read error: {e}"))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    let actual = hex::encode(hasher.finalize());
    if actual.eq_ignore_ascii_case(expected_hex) {
        Ok(())
    } else {
        Err(format!("sha256 mismatch for {path}: expected {expected_hex}, got {actual}"))
    }
}

/// Structural only: this kind asserts the
/// recorded exit code at checkpoint time was an integer, and never re-runs
/// the command.
fn verify_command_exit(exit_code: i32) -> Result<(), String> {
    let _ = exit_code;
    Ok(())
}

fn verify_db_row(
    db_path: Option<&str>,
    table: &str,
    where_: &std::collections::HashMap<String, serde_json::Value>,
    values: &std::collections::HashMap<String, serde_json::Value>) -> Result<(), String> {
    let Some(db_path) = db_path else {
        return Err("db_row evidence requires metadata.db_path".to_string());
    };
    let db = Database::open_at(Path::new(db_path)).map_err(|e| format!("cannot open {db_path}: {e}"))?;

    let mut clauses = Vec::new();
    let mut params: Vec<rusqlite::types::Value> = Vec::new();
    for (col, val) in where_ {
        clauses.push(format!("{col} = ?"));
        params.push(json_to_sql(val));
    }
    let where_sql = if clauses.is_empty() { "1 = 1".to_string() } else { clauses.join(" AND ") };
    // `table` is not user input in the product sense (it comes from a
    // checkpoint's stored evidence), but it cannot be bound as a parameter;
    // reject anything that isn't a bare identifier before interpolating.
    if !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!("invalid table name: {table}"));
    }
    let sql = format!("SELECT * FROM {table} WHERE {where_sql}");

    let rows: Vec<std::collections::HashMap<String, serde_json::Value>> = db
        .read(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let column_names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
            let rows = stmt
                .query_map(rusqlite::params_from_iter(params.iter()), |row| {
                    let mut map = std::collections::HashMap::new();
                    for (i, name) in column_names.iter().enumerate() {
                        let value: rusqlite::types::Value = row.get(i)?;
                        map.insert(name.clone(), sql_to_json(value));
                    }
                    Ok(map)
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .map_err(|e| format!("db_row query failed: {e}"))?;

    if rows.len() != 1 {
        return Err(format!("expected exactly one matching row, found {}", rows.len()));
    }
    let row = &rows[0];
    for (col, expected) in values {
        match row.get(col) {
            Some(actual) if actual == expected => {}
            Some(actual) => return Err(format!("column {col}: expected {expected}, got {actual}")),
            None => return Err(format!("column {col} not present in row")),
        }
    }
    Ok(())
}

fn json_to_sql(value: &serde_json::Value) -> rusqlite::types::Value {
    use rusqlite::types::Value as SqlValue;
    match value {
        serde_json::Value::Null => SqlValue::Null,
        serde_json::Value::Bool(b) => SqlValue::Integer(*b as i64),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                SqlValue::Integer(i)
            } else {
                SqlValue::Real(n.as_f64().unwrap_or(0.0))
            }
        }
        serde_json::Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn sql_to_json(value: rusqlite::types::Value) -> serde_json::Value {
    use rusqlite::types::Value as SqlValue;
    match value {
        SqlValue::Null => serde_json::Value::Null,
        SqlValue::Integer(i) => serde_json::Value::from(i),
        SqlValue::Real(f) => serde_json::Value::from(f),
        SqlValue::Text(s) => serde_json::Value::String(s),
        SqlValue::Blob(b) => serde_json::Value::String(hex::encode(b)),
    }
}

fn resolve(base_path: &Path, path: &str) -> std::path::PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_path.join(p)
    }
}

fn current_time() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "evidence_tests.rs"]
mod tests;
