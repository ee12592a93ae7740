use anyhow::Result;
use rusqlite::{params, Connection};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::memory::types::MemoryKind;

/// Response from memory_stats.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_memories: u64,
    pub vault_entries: u64,
    pub by_kind: BTreeMap<String, u64>,
    pub by_emotion: BTreeMap<String, u64>,
    pub db_size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_memory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_memory: Option<String>,
}

/// Compute memory store statistics, for one user or for the whole database.
///
/// `db_path` is used for file size calculation; pass None for in-memory databases.
pub fn memory_stats(
    conn: &Connection,
    user_id: Option<&str>,
    db_path: Option<&Path>,
) -> Result<StatsResponse> {
    // `?1 IS NULL` turns the owner filter off
    let total_memories = count(
        conn,
        "SELECT COUNT(*) FROM memories WHERE ?1 IS NULL OR user_id = ?1",
        user_id,
    )?;
    let vault_entries = count(
        conn,
        "SELECT COUNT(*) FROM vault_entries WHERE ?1 IS NULL OR user_id = ?1",
        user_id,
    )?;

    let mut by_kind: BTreeMap<String, u64> = MemoryKind::ALL
        .iter()
        .map(|k| (k.as_str().to_string(), 0))
        .collect();
    by_kind.extend(group_counts(conn, "kind", user_id)?);

    let by_emotion = group_counts(conn, "emotion", user_id)?;

    let (oldest_memory, newest_memory): (Option<String>, Option<String>) = conn.query_row(
        "SELECT MIN(created_at), MAX(created_at) FROM memories WHERE ?1 IS NULL OR user_id = ?1",
        params![user_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    let db_size_bytes = db_path
        .and_then(|p| std::fs::metadata(p).ok())
        .map(|m| m.len())
        .unwrap_or(0);

    Ok(StatsResponse {
        total_memories,
        vault_entries,
        by_kind,
        by_emotion,
        db_size_bytes,
        oldest_memory,
        newest_memory,
    })
}

fn count(conn: &Connection, sql: &str, user_id: Option<&str>) -> Result<u64> {
    let n: i64 = conn.query_row(sql, params![user_id], |row| row.get(0))?;
    Ok(n as u64)
}

/// `column` is one of our own column names, never user input.
fn group_counts(
    conn: &Connection,
    column: &str,
    user_id: Option<&str>,
) -> Result<BTreeMap<String, u64>> {
    let sql = format!(
        "SELECT {column}, COUNT(*) FROM memories WHERE ?1 IS NULL OR user_id = ?1 GROUP BY {column}"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![user_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
        })?
        .collect::<Result<BTreeMap<_, _>, _>>()?;
    Ok(rows)
}
