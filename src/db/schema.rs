//! SQL DDL for all EchoSoul tables.
//!
//! Defines `users`, `memories`, `memories_fts` (FTS5), `memories_vec` (vec0),
//! `vault_entries`, `personalities`, `memory_log`, and `schema_meta`. All DDL
//! uses `IF NOT EXISTS` for idempotent initialization.

use rusqlite::Connection;

const SCHEMA_SQL: &str = r#"
-- Account profiles, keyed by the e-mail derived user id
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    name TEXT,
    birth_date TEXT,
    timezone TEXT,
    bio TEXT,
    created_at TEXT NOT NULL,
    last_login TEXT,
    updated_at TEXT
);

-- Searchable (non-vault) memories
CREATE TABLE IF NOT EXISTS memories (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    kind TEXT NOT NULL CHECK(kind IN ('conversation','personal','secret','dream','goal','reflection','confession')),
    title TEXT,
    content TEXT NOT NULL,
    response TEXT,
    emotion TEXT NOT NULL DEFAULT 'neutral',
    emotion_details TEXT,
    response_style TEXT,
    context TEXT,
    tags TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_memories_user ON memories(user_id);
CREATE INDEX IF NOT EXISTS idx_memories_kind ON memories(kind);
CREATE INDEX IF NOT EXISTS idx_memories_emotion ON memories(emotion);
CREATE INDEX IF NOT EXISTS idx_memories_created ON memories(user_id, created_at);

-- Full-text search (BM25)
CREATE VIRTUAL TABLE IF NOT EXISTS memories_fts USING fts5(
    title,
    content,
    id UNINDEXED,
    user_id UNINDEXED,
    content='memories',
    content_rowid='rowid'
);

-- Encrypted private memories; never embedded
CREATE TABLE IF NOT EXISTS vault_entries (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    ciphertext TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_vault_user ON vault_entries(user_id);

-- Companion personality traits as a JSON object
CREATE TABLE IF NOT EXISTS personalities (
    user_id TEXT PRIMARY KEY,
    traits TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Audit log
CREATE TABLE IF NOT EXISTS memory_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    operation TEXT NOT NULL CHECK(operation IN ('create','delete','vault_create','vault_delete')),
    memory_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    details TEXT,
    created_at TEXT NOT NULL
);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// vec0 virtual table must be created separately (sqlite-vec syntax).
const VEC_TABLE_SQL: &str = r#"
CREATE VIRTUAL TABLE IF NOT EXISTS memories_vec USING vec0(
    id TEXT PRIMARY KEY,
    embedding FLOAT[384]
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute_batch(VEC_TABLE_SQL)?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_creates_all_tables() {
        crate::db::load_sqlite_vec();
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        for table in [
            "users",
            "memories",
            "vault_entries",
            "personalities",
            "memory_log",
            "schema_meta",
        ] {
            assert!(tables.contains(&table.to_string()), "{table} table missing");
        }

        let version: String = conn
            .query_row("SELECT vec_version()", [], |r| r.get(0))
            .unwrap();
        assert!(!version.is_empty());
    }

    #[test]
    fn schema_is_idempotent() {
        crate::db::load_sqlite_vec();
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
    }

    #[test]
    fn memory_kind_is_checked() {
        crate::db::load_sqlite_vec();
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO memories (id, user_id, kind, content, created_at)
             VALUES ('m1', 'u1', 'gossip', 'bad', '2024-01-01T00:00:00+00:00')",
            [],
        );
        assert!(result.is_err(), "unknown kind should be rejected by CHECK constraint");
    }
}
