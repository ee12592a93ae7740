//! Memory deletion.
//!
//! Removes a memory from the memories table, the FTS5 index and the vector
//! index, leaving an audit record behind.

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

use super::store::write_audit_log;

/// Permanently delete one of the user's memories.
///
/// Fails with "memory not found" when the id does not exist or belongs to
/// another user.
pub fn delete_memory(conn: &mut Connection, user_id: &str, memory_id: &str) -> Result<()> {
    let tx = conn.transaction()?;

    let row: Option<(i64, Option<String>, String)> = tx
        .query_row(
            "SELECT rowid, title, content FROM memories WHERE id = ?1 AND user_id = ?2",
            params![memory_id, user_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;
    let Some((rowid, title, content)) = row else {
        anyhow::bail!("memory not found: {memory_id}");
    };

    // External content table requires the special 'delete' command with the old values
    tx.execute(
        "INSERT INTO memories_fts(memories_fts, rowid, title, content, id, user_id) \
         VALUES('delete', ?1, ?2, ?3, ?4, ?5)",
        params![rowid, title.unwrap_or_default(), content, memory_id, user_id],
    )?;
    tx.execute("DELETE FROM memories_vec WHERE id = ?1", params![memory_id])?;
    write_audit_log(&tx, "delete", memory_id, user_id, None)?;
    tx.execute("DELETE FROM memories WHERE id = ?1", params![memory_id])?;

    tx.commit()?;
    tracing::info!(id = memory_id, "memory deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::EMBEDDING_DIM;
    use crate::memory::store::store_memory;
    use crate::memory::types::{MemoryKind, NewMemory};

    fn setup() -> (Connection, String) {
        let mut conn = crate::db::open_memory_database().unwrap();
        let mut emb = vec![0.0f32; EMBEDDING_DIM];
        emb[7] = 1.0;
        let id = store_memory(
            &mut conn,
            "u1",
            NewMemory::new(MemoryKind::Confession, "I broke the vase").with_title("Vase"),
            &emb,
        )
        .unwrap()
        .id;
        (conn, id)
    }

    #[test]
    fn delete_removes_every_index() {
        let (mut conn, id) = setup();
        delete_memory(&mut conn, "u1", &id).unwrap();

        for sql in [
            "SELECT COUNT(*) FROM memories",
            "SELECT COUNT(*) FROM memories_vec",
            "SELECT COUNT(*) FROM memories_fts WHERE memories_fts MATCH 'vase'",
        ] {
            let n: i64 = conn.query_row(sql, [], |r| r.get(0)).unwrap();
            assert_eq!(n, 0, "{sql}");
        }

        let op: String = conn
            .query_row(
                "SELECT operation FROM memory_log WHERE memory_id = ?1 ORDER BY id DESC",
                params![id],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(op, "delete");
    }

    #[test]
    fn other_users_cannot_delete() {
        let (mut conn, id) = setup();
        let err = delete_memory(&mut conn, "u2", &id).unwrap_err();
        assert!(err.to_string().contains("memory not found"));

        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM memories", [], |r| r.get(0))
            .unwrap();
        assert_eq!(n, 1);
    }
}
