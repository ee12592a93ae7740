pub mod forget;
pub mod search;
pub mod stats;
pub mod store;
pub mod timeline;
pub mod types;

use rusqlite::Row;

use crate::emotion::Emotion;
use types::{Memory, MemoryKind};

/// Column list matching [`memory_from_row`].
pub(crate) const MEMORY_COLUMNS: &str = "id, user_id, kind, title, content, response, emotion, \
     emotion_details, response_style, context, tags, created_at";

/// Convert an f32 embedding slice to raw bytes for sqlite-vec.
pub fn embedding_to_bytes(embedding: &[f32]) -> &[u8] {
    unsafe {
        std::slice::from_raw_parts(
            embedding.as_ptr() as *const u8,
            embedding.len() * std::mem::size_of::<f32>(),
        )
    }
}

/// Map a `memories` row selected with [`MEMORY_COLUMNS`].
///
/// Malformed JSON columns read as absent; an emotion name this build does not
/// know reads as neutral.
pub(crate) fn memory_from_row(row: &Row<'_>) -> rusqlite::Result<Memory> {
    let kind: String = row.get(2)?;
    let kind = kind.parse::<MemoryKind>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, e.into())
    })?;
    let emotion: String = row.get(6)?;
    let json = |idx: usize| -> rusqlite::Result<Option<String>> { row.get(idx) };

    Ok(Memory {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind,
        title: row.get(3)?,
        content: row.get(4)?,
        response: row.get(5)?,
        emotion: emotion.parse().unwrap_or(Emotion::Neutral),
        emotion_details: json(7)?.and_then(|s| serde_json::from_str(&s).ok()),
        response_style: json(8)?.and_then(|s| serde_json::from_str(&s).ok()),
        context: json(9)?.and_then(|s| serde_json::from_str(&s).ok()),
        tags: json(10)?
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default(),
        timestamp: row.get(11)?,
        encrypted: false,
    })
}
