//! Write path: insert, FTS sync, embedding, and audit logging.
//!
//! [`store_memory`] is the single entry point. The row, its FTS5 entry, its
//! vector and the audit record are written in one transaction.

use anyhow::{ensure, Result};
use rusqlite::{params, Connection, Transaction};

use crate::embedding::EMBEDDING_DIM;
use crate::memory::types::{Memory, NewMemory};

/// Store a memory for `user_id`, stamped with a fresh UUID v7 and the current time.
pub fn store_memory(
    conn: &mut Connection,
    user_id: &str,
    memory: NewMemory,
    embedding: &[f32],
) -> Result<Memory> {
    store_memory_at(
        conn,
        user_id,
        memory,
        embedding,
        chrono::Utc::now().to_rfc3339(),
    )
}

/// Like [`store_memory`] with an explicit RFC 3339 timestamp (imports, tests).
pub fn store_memory_at(
    conn: &mut Connection,
    user_id: &str,
    memory: NewMemory,
    embedding: &[f32],
    timestamp: String,
) -> Result<Memory> {
    ensure!(!memory.content.trim().is_empty(), "memory content must not be empty");
    ensure!(
        embedding.len() == EMBEDDING_DIM,
        "embedding has {} dimensions, expected {EMBEDDING_DIM}",
        embedding.len()
    );

    let id = uuid::Uuid::now_v7().to_string();
    let memory = Memory::from_new(memory, id, user_id, timestamp);

    let tx = conn.transaction()?;
    let rowid = insert_memory(&tx, &memory)?;
    insert_fts(&tx, rowid, &memory)?;
    insert_vec(&tx, &memory.id, embedding)?;
    write_audit_log(
        &tx,
        "create",
        &memory.id,
        user_id,
        Some(&serde_json::json!({"type": memory.kind.as_str(), "emotion": memory.emotion})),
    )?;
    tx.commit()?;

    tracing::debug!(id = %memory.id, kind = %memory.kind, emotion = %memory.emotion, "memory stored");
    Ok(memory)
}

/// Insert a new memory row. Returns the SQLite rowid for FTS5 sync.
fn insert_memory(conn: &Transaction, memory: &Memory) -> Result<i64> {
    let emotion_details = memory
        .emotion_details
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    let response_style = memory
        .response_style
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    let context = memory.context.as_ref().map(|c| c.to_string());
    let tags = serde_json::to_string(&memory.tags)?;

    conn.execute(
        "INSERT INTO memories (id, user_id, kind, title, content, response, emotion, \
         emotion_details, response_style, context, tags, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            memory.id,
            memory.user_id,
            memory.kind.as_str(),
            memory.title,
            memory.content,
            memory.response,
            memory.emotion.as_str(),
            emotion_details,
            response_style,
            context,
            tags,
            memory.timestamp,
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

/// Sync the FTS5 index. Must use the same rowid as the `memories` row.
fn insert_fts(conn: &Transaction, rowid: i64, memory: &Memory) -> Result<()> {
    conn.execute(
        "INSERT INTO memories_fts (rowid, title, content, id, user_id) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            rowid,
            memory.title.as_deref().unwrap_or(""),
            memory.content,
            memory.id,
            memory.user_id
        ],
    )?;
    Ok(())
}

fn insert_vec(conn: &Transaction, id: &str, embedding: &[f32]) -> Result<()> {
    conn.execute(
        "INSERT INTO memories_vec (id, embedding) VALUES (?1, ?2)",
        params![id, super::embedding_to_bytes(embedding)],
    )?;
    Ok(())
}

/// Write an entry to the memory_log audit table.
pub(crate) fn write_audit_log(
    conn: &Connection,
    operation: &str,
    memory_id: &str,
    user_id: &str,
    details: Option<&serde_json::Value>,
) -> Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    let details_json = details.map(|d| d.to_string());
    conn.execute(
        "INSERT INTO memory_log (operation, memory_id, user_id, details, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![operation, memory_id, user_id, details_json, now],
    )?;
    Ok(())
}
