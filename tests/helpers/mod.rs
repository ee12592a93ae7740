#![allow(dead_code)]

use echosoul::brain::CompanionServices;
use echosoul::config::EchoConfig;
use echosoul::db;
use echosoul::embedding::{l2_normalize, EmbeddingProvider, EMBEDDING_DIM};
use echosoul::emotion::lexicon::LexiconClassifier;
use echosoul::emotion::{Emotion, EmotionAnalyzer};
use echosoul::memory::types::{Memory, MemoryKind, NewMemory};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    db::load_sqlite_vec();
    let conn = Connection::open_in_memory().unwrap();
    conn.pragma_update(None, "foreign_keys", "ON").unwrap();
    db::schema::init_schema(&conn).unwrap();
    db::migrations::run_migrations(&conn).unwrap();
    conn
}

/// Generate a deterministic 384-dim embedding with a spike at position `seed`.
/// Each seed produces a distinct, orthogonal vector.
pub fn test_embedding(seed: u8) -> Vec<f32> {
    let mut v = vec![0.0f32; EMBEDDING_DIM];
    v[seed as usize % EMBEDDING_DIM] = 1.0;
    v
}

/// Generate an embedding close to `base`.
pub fn similar_embedding(base: &[f32]) -> Vec<f32> {
    let mut v = base.to_vec();
    for i in 0..5 {
        v[(i * 37) % EMBEDDING_DIM] += 0.05;
    }
    l2_normalize(&v)
}

/// Store a memory of `kind` for `user_id`. Returns the stored record.
pub fn insert_memory(
    conn: &mut Connection,
    user_id: &str,
    kind: MemoryKind,
    content: &str,
    emotion: Emotion,
    embedding: &[f32],
) -> Memory {
    let new = NewMemory::new(kind, content).with_emotion(emotion);
    echosoul::memory::store::store_memory(conn, user_id, new, embedding).unwrap()
}

/// Like [`insert_memory`] with a fixed timestamp.
pub fn insert_memory_at(
    conn: &mut Connection,
    user_id: &str,
    content: &str,
    emotion: Emotion,
    timestamp: &str,
    seed: u8,
) -> Memory {
    let new = NewMemory::new(MemoryKind::Personal, content).with_emotion(emotion);
    echosoul::memory::store::store_memory_at(
        conn,
        user_id,
        new,
        &test_embedding(seed),
        timestamp.to_string(),
    )
    .unwrap()
}

/// Bag-of-words embedding: each word lights one hashed dimension.
pub struct BagOfWordsEmbedding;

impl EmbeddingProvider for BagOfWordsEmbedding {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut v = vec![0.0f32; EMBEDDING_DIM];
        for word in text.split_whitespace() {
            let word = word.to_lowercase();
            let slot = word
                .bytes()
                .fold(7usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize))
                % EMBEDDING_DIM;
            v[slot] += 1.0;
        }
        v[EMBEDDING_DIM - 1] += 0.01;
        Ok(l2_normalize(&v))
    }
}

/// Services over an in-memory database, lexicon emotions, and no Gemini.
pub fn test_services() -> CompanionServices {
    CompanionServices {
        db: Arc::new(Mutex::new(test_db())),
        embedding: Arc::new(BagOfWordsEmbedding),
        analyzer: Arc::new(EmotionAnalyzer::new(Box::new(LexiconClassifier::new()))),
        llm: None,
        config: Arc::new(EchoConfig::default()),
    }
}
