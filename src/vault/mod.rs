//! Private memory vault.
//!
//! Vault memories are stored only as ciphertext in `vault_entries`. They are
//! never embedded, so they never surface in recall or the timeline. A [`Vault`]
//! starts locked; every read or write requires [`Vault::unlock`] first.

pub mod cipher;

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::memory::types::{Memory, NewMemory};
pub use cipher::VaultCipher;

/// Title given to vault memories saved without one.
pub const UNTITLED: &str = "Untitled Memory";

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("vault is locked")]
    Locked,

    #[error("incorrect vault password")]
    WrongPassword,

    #[error("memory content must not be empty")]
    EmptyContent,

    #[error("vault entry not found: {0}")]
    NotFound(String),

    #[error("encryption failed")]
    EncryptionFailed,

    #[error("decryption failed: wrong key or tampered data")]
    DecryptionFailed,

    #[error("invalid vault entry format")]
    InvalidFormat,

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VaultSort {
    #[default]
    Newest,
    Oldest,
    /// Alphabetical by emotion name.
    Emotion,
}

impl std::str::FromStr for VaultSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            "emotion" => Ok(Self::Emotion),
            _ => Err(format!("unknown sort order: {s} (expected newest, oldest, emotion)")),
        }
    }
}

pub struct Vault {
    user_id: String,
    cipher: VaultCipher,
    password: String,
    unlocked: bool,
}

impl Vault {
    /// A locked vault for `user_id`. `encryption_key` feeds the per-user key;
    /// `password` gates [`Vault::unlock`].
    pub fn new(user_id: &str, encryption_key: &str, password: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            cipher: VaultCipher::for_user(user_id, encryption_key),
            password: password.to_string(),
            unlocked: false,
        }
    }

    pub fn from_config(user_id: &str, config: &crate::config::VaultConfig) -> Self {
        Self::new(user_id, &config.encryption_key, &config.password)
    }

    pub fn unlock(&mut self, password: &str) -> Result<(), VaultError> {
        if password != self.password {
            tracing::warn!(user = %self.user_id, "vault unlock rejected");
            return Err(VaultError::WrongPassword);
        }
        self.unlocked = true;
        Ok(())
    }

    pub fn lock(&mut self) {
        self.unlocked = false;
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    fn ensure_unlocked(&self) -> Result<(), VaultError> {
        if self.unlocked {
            Ok(())
        } else {
            Err(VaultError::Locked)
        }
    }

    /// Encrypt and store a memory. Returns the stored record.
    pub fn store(&self, conn: &Connection, memory: NewMemory) -> Result<Memory, VaultError> {
        self.ensure_unlocked()?;
        if memory.content.trim().is_empty() {
            return Err(VaultError::EmptyContent);
        }

        let mut memory = Memory::from_new(
            memory,
            uuid::Uuid::now_v7().to_string(),
            &self.user_id,
            chrono::Utc::now().to_rfc3339(),
        );
        if memory.title.as_deref().map_or(true, |t| t.trim().is_empty()) {
            memory.title = Some(UNTITLED.to_string());
        }
        memory.encrypted = true;

        let ciphertext = self.cipher.encrypt(&serde_json::to_string(&memory)?)?;
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO vault_entries (id, user_id, ciphertext, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![memory.id, self.user_id, ciphertext, memory.timestamp],
        )?;
        self.log_operation(&tx, "vault_create", &memory.id)?;
        tx.commit()?;

        tracing::info!(id = %memory.id, "vault memory stored");
        Ok(memory)
    }

    /// Decrypt every entry of this user, oldest first. Entries that fail to
    /// decrypt or parse are skipped with a warning.
    pub fn list(&self, conn: &Connection) -> Result<Vec<Memory>, VaultError> {
        self.ensure_unlocked()?;

        let mut stmt = conn.prepare(
            "SELECT id, ciphertext FROM vault_entries WHERE user_id = ?1 ORDER BY created_at, rowid",
        )?;
        let rows = stmt
            .query_map(params![self.user_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut memories = Vec::with_capacity(rows.len());
        for (id, ciphertext) in rows {
            let decoded = self
                .cipher
                .decrypt(&ciphertext)
                .and_then(|json| serde_json::from_str::<Memory>(&json).map_err(VaultError::from));
            match decoded {
                Ok(memory) => memories.push(memory),
                Err(e) => tracing::warn!(id = %id, error = %e, "skipping unreadable vault entry"),
            }
        }
        Ok(memories)
    }

    /// Case-insensitive substring match on content or title, then sorted.
    /// An empty query matches everything.
    pub fn search(
        &self,
        conn: &Connection,
        query: &str,
        sort: VaultSort,
    ) -> Result<Vec<Memory>, VaultError> {
        let needle = query.to_lowercase();
        let mut memories: Vec<Memory> = self
            .list(conn)?
            .into_iter()
            .filter(|m| {
                needle.is_empty()
                    || m.content.to_lowercase().contains(&needle)
                    || m
                        .title
                        .as_deref()
                        .is_some_and(|t| t.to_lowercase().contains(&needle))
            })
            .collect();

        match sort {
            VaultSort::Newest => memories.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
            VaultSort::Oldest => memories.sort_by(|a, b| a.timestamp.cmp(&b.timestamp)),
            VaultSort::Emotion => memories.sort_by(|a, b| a.emotion.as_str().cmp(b.emotion.as_str())),
        }
        Ok(memories)
    }

    pub fn delete(&self, conn: &Connection, id: &str) -> Result<(), VaultError> {
        self.ensure_unlocked()?;

        let exists: Option<String> = conn
            .query_row(
                "SELECT id FROM vault_entries WHERE id = ?1 AND user_id = ?2",
                params![id, self.user_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(VaultError::NotFound(id.to_string()));
        }

        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM vault_entries WHERE id = ?1 AND user_id = ?2",
            params![id, self.user_id],
        )?;
        self.log_operation(&tx, "vault_delete", id)?;
        tx.commit()?;
        tracing::info!(id, "vault memory deleted");
        Ok(())
    }

    /// Audit record without details; the plaintext never reaches the log.
    fn log_operation(&self, conn: &Connection, operation: &str, id: &str) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT INTO memory_log (operation, memory_id, user_id, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![operation, id, self.user_id, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::Emotion;
    use crate::memory::types::MemoryKind;

    fn unlocked(user: &str) -> Vault {
        let mut vault = Vault::new(user, "test-key", "echosoul");
        vault.unlock("echosoul").unwrap();
        vault
    }

    #[test]
    fn locked_vault_refuses_everything() {
        let conn = crate::db::open_memory_database().unwrap();
        let vault = Vault::new("u1", "k", "echosoul");
        assert!(matches!(
            vault.store(&conn, NewMemory::new(MemoryKind::Secret, "x")),
            Err(VaultError::Locked)
        ));
        assert!(matches!(vault.list(&conn), Err(VaultError::Locked)));
        assert!(matches!(vault.delete(&conn, "x"), Err(VaultError::Locked)));
    }

    #[test]
    fn wrong_password_keeps_vault_locked() {
        let mut vault = Vault::new("u1", "k", "echosoul");
        assert!(matches!(vault.unlock("guess"), Err(VaultError::WrongPassword)));
        assert!(!vault.is_unlocked());
        vault.unlock("echosoul").unwrap();
        assert!(vault.is_unlocked());
        vault.lock();
        assert!(!vault.is_unlocked());
    }

    #[test]
    fn stored_entries_are_ciphertext_only() {
        let conn = crate::db::open_memory_database().unwrap();
        let vault = unlocked("u1");
        let stored = vault
            .store(&conn, NewMemory::new(MemoryKind::Secret, "I still sleep with a nightlight"))
            .unwrap();
        assert!(stored.encrypted);
        assert_eq!(stored.title.as_deref(), Some(UNTITLED));

        let raw: String = conn
            .query_row("SELECT ciphertext FROM vault_entries", [], |r| r.get(0))
            .unwrap();
        assert!(raw.starts_with("enc2:"));
        assert!(!raw.contains("nightlight"));

        let memories: i64 = conn
            .query_row("SELECT COUNT(*) FROM memories", [], |r| r.get(0))
            .unwrap();
        assert_eq!(memories, 0);

        let listed = vault.list(&conn).unwrap();
        assert_eq!(listed, vec![stored]);
    }

    #[test]
    fn store_and_audit_commit_together() {
        let conn = crate::db::open_memory_database().unwrap();
        let vault = unlocked("u1");
        let stored = vault
            .store(&conn, NewMemory::new(MemoryKind::Dream, "Flying over the harbour"))
            .unwrap();
        let logged: String = conn
            .query_row(
                "SELECT operation FROM memory_log WHERE memory_id = ?1",
                [&stored.id],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(logged, "vault_create");

        conn.execute_batch(
            "CREATE TRIGGER refuse_log BEFORE INSERT ON memory_log
             BEGIN SELECT RAISE(ABORT, 'log unavailable'); END;",
        )
        .unwrap();
        assert!(vault
            .store(&conn, NewMemory::new(MemoryKind::Secret, "never half-written"))
            .is_err());
        assert!(vault.delete(&conn, &stored.id).is_err());

        let entries: i64 = conn
            .query_row("SELECT COUNT(*) FROM vault_entries", [], |r| r.get(0))
            .unwrap();
        assert_eq!(entries, 1);
        assert_eq!(vault.list(&conn).unwrap(), vec![stored]);
    }

    #[test]
    fn empty_content_is_rejected() {
        let conn = crate::db::open_memory_database().unwrap();
        assert!(matches!(
            unlocked("u1").store(&conn, NewMemory::new(MemoryKind::Secret, "  ")),
            Err(VaultError::EmptyContent)
        ));
    }

    #[test]
    fn list_skips_entries_under_another_key() {
        let conn = crate::db::open_memory_database().unwrap();
        unlocked("u1")
            .store(&conn, NewMemory::new(MemoryKind::Dream, "readable"))
            .unwrap();
        // same user, but written under a different server secret
        let mut other = Vault::new("u1", "rotated-key", "echosoul");
        other.unlock("echosoul").unwrap();
        other
            .store(&conn, NewMemory::new(MemoryKind::Dream, "unreadable"))
            .unwrap();

        let listed = unlocked("u1").list(&conn).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].content, "readable");
    }

    #[test]
    fn search_filters_and_sorts() {
        let conn = crate::db::open_memory_database().unwrap();
        let vault = unlocked("u1");
        vault
            .store(
                &conn,
                NewMemory::new(MemoryKind::Secret, "The lake house in summer")
                    .with_emotion(Emotion::Love),
            )
            .unwrap();
        vault
            .store(
                &conn,
                NewMemory::new(MemoryKind::Confession, "I lied about the exam")
                    .with_title("Lake trip confession")
                    .with_emotion(Emotion::Anxiety),
            )
            .unwrap();
        vault
            .store(&conn, NewMemory::new(MemoryKind::Goal, "Run 10k"))
            .unwrap();

        let hits = vault.search(&conn, "LAKE", VaultSort::Emotion).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].emotion, Emotion::Anxiety);
        assert_eq!(hits[1].emotion, Emotion::Love);

        let all = vault.search(&conn, "", VaultSort::Oldest).unwrap();
        assert_eq!(all.len(), 3);
        let newest = vault.search(&conn, "", VaultSort::Newest).unwrap();
        assert!(newest[0].timestamp >= newest[2].timestamp);
    }

    #[test]
    fn delete_is_scoped_to_user() {
        let conn = crate::db::open_memory_database().unwrap();
        let mine = unlocked("u1");
        let stored = mine
            .store(&conn, NewMemory::new(MemoryKind::Secret, "mine"))
            .unwrap();

        assert!(matches!(
            unlocked("u2").delete(&conn, &stored.id),
            Err(VaultError::NotFound(_))
        ));
        mine.delete(&conn, &stored.id).unwrap();
        assert!(mine.list(&conn).unwrap().is_empty());
    }

    #[test]
    fn sort_parses_case_insensitively() {
        assert_eq!("Newest".parse::<VaultSort>().unwrap(), VaultSort::Newest);
        assert_eq!("emotion".parse::<VaultSort>().unwrap(), VaultSort::Emotion);
        assert!("random".parse::<VaultSort>().is_err());
    }
}
