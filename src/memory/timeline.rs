//! Chronological reads over a user's (non-vault) memories.

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};

use crate::memory::types::{Memory, MemoryKind};
use crate::memory::{memory_from_row, MEMORY_COLUMNS};

/// All of the user's memories with `start <= timestamp <= end`, oldest first,
/// optionally only those of one kind.
///
/// Bounds accept RFC 3339, `YYYY-MM-DDTHH:MM:SS` (read as UTC), or a bare
/// `YYYY-MM-DD` meaning midnight UTC of that day. When a bound is given,
/// memories with unparsable timestamps are skipped.
pub fn get_timeline(
    conn: &Connection,
    user_id: &str,
    start: Option<&str>,
    end: Option<&str>,
    kind: Option<MemoryKind>,
) -> Result<Vec<Memory>> {
    let start = start
        .map(|s| parse_bound(s).with_context(|| format!("invalid start date: {s}")))
        .transpose()?;
    let end = end
        .map(|s| parse_bound(s).with_context(|| format!("invalid end date: {s}")))
        .transpose()?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {MEMORY_COLUMNS} FROM memories
         WHERE user_id = ?1 AND (?2 IS NULL OR kind = ?2)
         ORDER BY created_at, rowid"
    ))?;
    let memories = stmt
        .query_map(params![user_id, kind.map(|k| k.as_str())], memory_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    if start.is_none() && end.is_none() {
        return Ok(memories);
    }

    Ok(memories
        .into_iter()
        .filter(|m| {
            let Ok(at) = DateTime::parse_from_rfc3339(&m.timestamp) else {
                return false;
            };
            start.map_or(true, |s| at >= s) && end.map_or(true, |e| at <= e)
        })
        .collect())
}

/// Number of non-vault memories stored for the user.
pub fn count_memories(conn: &Connection, user_id: &str) -> Result<u64> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM memories WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )?;
    Ok(n as u64)
}

/// Parse a timeline bound.
pub fn parse_bound(s: &str) -> Result<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt);
    }
    let utc = FixedOffset::east_opt(0).context("zero offset")?;
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_local_timezone(utc).single().context("ambiguous time")?);
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")?;
    let midnight = date.and_hms_opt(0, 0, 0).context("invalid midnight")?;
    midnight
        .and_local_timezone(utc)
        .single()
        .context("ambiguous time")
}
