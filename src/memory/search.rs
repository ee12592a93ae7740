use anyhow::Result;
use rusqlite::{params, Connection};
use serde::Serialize;
use std::collections::HashMap;

use crate::memory::types::{Memory, MemoryKind};
use crate::memory::{memory_from_row, MEMORY_COLUMNS};

/// A recalled memory with its ranking signals.
#[derive(Debug, Clone, Serialize)]
pub struct RecalledMemory {
    #[serde(flatten)]
    pub memory: Memory,
    /// Cosine similarity to the query embedding; 0.0 when matched by keywords only.
    pub similarity: f64,
    /// Reciprocal Rank Fusion score used for ordering.
    pub score: f64,
}

/// Search configuration knobs.
pub struct SearchConfig {
    pub max_results: usize,
    pub rrf_k: usize,
}

/// Hybrid search over one user's memories: vector KNN + FTS5 BM25, merged by RRF.
///
/// Both rankings are restricted to the user (and kind) before they are cut,
/// so other users' memories never crowd out this user's candidates.
pub fn retrieve_memories(
    conn: &Connection,
    user_id: &str,
    query_embedding: &[f32],
    query_text: &str,
    kind: Option<MemoryKind>,
    config: &SearchConfig,
) -> Result<Vec<RecalledMemory>> {
    if config.max_results == 0 {
        return Ok(Vec::new());
    }
    let candidate_limit = (config.max_results * 10).max(50);

    // 1. Vector KNN over the user's own vectors
    let vec_results = vector_search(conn, user_id, kind, query_embedding, candidate_limit)?;

    // 2. FTS5 BM25 search, same restrictions
    let fts_results = fts_search(conn, user_id, kind, query_text, candidate_limit)?;

    // 3. Hydrate
    let mut ids: Vec<&str> = vec_results.iter().map(|(id, _)| id.as_str()).collect();
    ids.extend(fts_results.iter().map(|(id, _)| id.as_str()));
    let memories = fetch_memories(conn, &ids)?;

    // 4. RRF merge over the filtered rankings
    let merged = rrf_merge(&vec_results, &fts_results, config.rrf_k);

    let distances: HashMap<&str, f64> = vec_results
        .iter()
        .map(|(id, d)| (id.as_str(), *d))
        .collect();

    let results = merged
        .into_iter()
        .take(config.max_results)
        .filter_map(|(id, score)| {
            let memory = memories.get(id.as_str())?.clone();
            let similarity = distances
                .get(id.as_str())
                .map(|d| l2_to_cosine(*d))
                .unwrap_or(0.0);
            Some(RecalledMemory {
                memory,
                similarity,
                score,
            })
        })
        .collect();

    Ok(results)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// L2 distance between unit vectors to cosine similarity: `1 - d²/2`.
fn l2_to_cosine(distance: f64) -> f64 {
    1.0 - distance * distance / 2.0
}

/// Nearest of the user's vectors by L2 distance, via sqlite-vec.
///
/// The vec0 table holds every user's vectors; the owner and kind filters are
/// applied through the join before ordering, so the limit only counts rows
/// this user may see.
fn vector_search(
    conn: &Connection,
    user_id: &str,
    kind: Option<MemoryKind>,
    embedding: &[f32],
    limit: usize,
) -> Result<Vec<(String, f64)>> {
    let embedding_bytes = super::embedding_to_bytes(embedding);
    let mut stmt = conn.prepare(
        "SELECT m.id, vec_distance_l2(v.embedding, ?1) AS distance \
         FROM memories m JOIN memories_vec v ON v.id = m.id \
         WHERE m.user_id = ?2 AND (?3 IS NULL OR m.kind = ?3) \
         ORDER BY distance LIMIT ?4",
    )?;
    let results = stmt
        .query_map(
            params![embedding_bytes, user_id, kind.map(|k| k.as_str()), limit as i64],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)),
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(results)
}

/// FTS5 BM25 keyword search. Returns (id, rank) pairs, best first.
fn fts_search(
    conn: &Connection,
    user_id: &str,
    kind: Option<MemoryKind>,
    query_text: &str,
    limit: usize,
) -> Result<Vec<(String, f64)>> {
    let escaped = escape_fts_query(query_text);
    if escaped.is_empty() {
        return Ok(Vec::new());
    }

    let mut stmt = conn.prepare(
        "SELECT m.id, memories_fts.rank FROM memories_fts \
         JOIN memories m ON m.rowid = memories_fts.rowid \
         WHERE memories_fts MATCH ?1 AND m.user_id = ?2 AND (?3 IS NULL OR m.kind = ?3) \
         ORDER BY memories_fts.rank LIMIT ?4",
    )?;
    let results = stmt
        .query_map(
            params![escaped, user_id, kind.map(|k| k.as_str()), limit as i64],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)),
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(results)
}

/// Escape a user query for FTS5 MATCH syntax.
///
/// Each word is quoted so punctuation cannot form FTS5 operators. Words are
/// OR-ed: chat messages are long, and an implicit AND would rarely match.
fn escape_fts_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(|word| word.replace('"', ""))
        .filter(|w| !w.is_empty())
        .map(|w| format!("\"{w}\""))
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// Reciprocal Rank Fusion merge.
///
/// Documents appearing in both lists get additive scores. Equal scores keep
/// the order in which ids were first seen.
fn rrf_merge(
    vec_results: &[(String, f64)],
    fts_results: &[(String, f64)],
    k: usize,
) -> Vec<(String, f64)> {
    let mut merged: Vec<(String, f64)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for list in [vec_results, fts_results] {
        for (rank, (id, _)) in list.iter().enumerate() {
            let contribution = 1.0 / (k as f64 + rank as f64);
            match positions.get(id) {
                Some(&pos) => merged[pos].1 += contribution,
                None => {
                    positions.insert(id.clone(), merged.len());
                    merged.push((id.clone(), contribution));
                }
            }
        }
    }

    merged.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    merged
}

/// Batch-fetch memory records by IDs.
fn fetch_memories(conn: &Connection, ids: &[&str]) -> Result<HashMap<String, Memory>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "SELECT {MEMORY_COLUMNS} FROM memories WHERE id IN ({})",
        placeholders.join(", ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::types::ToSql> =
        ids.iter().map(|id| id as &dyn rusqlite::types::ToSql).collect();

    let rows = stmt
        .query_map(params.as_slice(), memory_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows.into_iter().map(|m| (m.id.clone(), m)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::EMBEDDING_DIM;
    use crate::memory::store;
    use crate::memory::types::NewMemory;

    fn test_db() -> Connection {
        crate::db::open_memory_database().unwrap()
    }

    fn spike(dim: usize) -> Vec<f32> {
        let mut v = vec![0.0f32; EMBEDDING_DIM];
        v[dim] = 1.0;
        v
    }

    fn insert(conn: &mut Connection, user: &str, kind: MemoryKind, content: &str, dim: usize) -> String {
        store::store_memory(conn, user, NewMemory::new(kind, content), &spike(dim))
            .unwrap()
            .id
    }

    fn config(max_results: usize) -> SearchConfig {
        SearchConfig {
            max_results,
            rrf_k: 60,
        }
    }

    #[test]
    fn test_vector_search_returns_nearest() {
        let mut conn = test_db();
        let near = insert(&mut conn, "u1", MemoryKind::Personal, "Hiking in the Alps", 0);
        let _far = insert(&mut conn, "u1", MemoryKind::Personal, "Tax forms are due", 200);

        let results =
            retrieve_memories(&conn, "u1", &spike(0), "", None, &config(1)).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].memory.id, near);
        assert!((results[0].similarity - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_other_users_memories_are_invisible() {
        let mut conn = test_db();
        insert(&mut conn, "u2", MemoryKind::Personal, "Secret garden plans", 0);
        let mine = insert(&mut conn, "u1", MemoryKind::Personal, "Vegetable garden", 1);

        let results =
            retrieve_memories(&conn, "u1", &spike(0), "garden", None, &config(5)).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].memory.id, mine);
    }

    #[test]
    fn test_crowded_index_still_recalls_own_memory() {
        let mut conn = test_db();
        for i in 0..60 {
            insert(&mut conn, "u2", MemoryKind::Personal, &format!("neighbour note {i}"), 0);
        }
        let mine = insert(&mut conn, "u1", MemoryKind::Personal, "Quiet morning walk", 1);

        let results = retrieve_memories(&conn, "u1", &spike(0), "", None, &config(3)).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].memory.id, mine);
    }

    #[test]
    fn test_kind_filter_applies_before_limit() {
        let mut conn = test_db();
        for i in 0..60 {
            insert(&mut conn, "u1", MemoryKind::Conversation, &format!("chat {i}"), 0);
        }
        let goal = insert(&mut conn, "u1", MemoryKind::Goal, "Run ten kilometres", 2);

        let results = retrieve_memories(
            &conn,
            "u1",
            &spike(0),
            "",
            Some(MemoryKind::Goal),
            &config(1),
        )
        .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].memory.id, goal);
    }

    #[test]
    fn test_kind_filter() {
        let mut conn = test_db();
        insert(&mut conn, "u1", MemoryKind::Conversation, "I dreamt of the ocean", 0);
        let dream = insert(&mut conn, "u1", MemoryKind::Dream, "The ocean was purple", 1);

        let results = retrieve_memories(
            &conn,
            "u1",
            &spike(0),
            "ocean",
            Some(MemoryKind::Dream),
            &config(5),
        )
        .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].memory.id, dream);
    }

    #[test]
    fn test_rrf_merge_combines_signals() {
        let vec_results = vec![("a".to_string(), 0.1), ("b".to_string(), 0.2)];
        let fts_results = vec![("b".to_string(), -5.0), ("c".to_string(), -3.0)];
        let merged = rrf_merge(&vec_results, &fts_results, 60);

        assert_eq!(merged[0].0, "b");
        assert!((merged[0].1 - (1.0 / 61.0 + 1.0 / 60.0)).abs() < 1e-12);
        // a and c tie; a was seen first
        assert_eq!(merged[1].0, "a");
        assert_eq!(merged[2].0, "c");
    }

    #[test]
    fn test_keyword_match_surfaces_distant_vector() {
        let mut conn = test_db();
        for i in 0..3 {
            insert(&mut conn, "u1", MemoryKind::Personal, &format!("filler note {i}"), i);
        }
        let keyword = insert(&mut conn, "u1", MemoryKind::Personal, "My cat Biscuit", 300);

        let results =
            retrieve_memories(&conn, "u1", &spike(0), "Biscuit", None, &config(2)).unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.memory.id.as_str()).collect();
        assert!(ids.contains(&keyword.as_str()));
    }

    #[test]
    fn test_empty_store_returns_nothing() {
        let conn = test_db();
        let results =
            retrieve_memories(&conn, "u1", &spike(0), "anything", None, &config(5)).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_escape_fts_query() {
        assert_eq!(escape_fts_query("hello world"), "\"hello\" OR \"world\"");
        assert_eq!(escape_fts_query("say \"hi\" AND"), "\"say\" OR \"hi\" OR \"AND\"");
        assert_eq!(escape_fts_query("  \"\"  "), "");
    }

    #[test]
    fn test_l2_to_cosine() {
        assert!((l2_to_cosine(0.0) - 1.0).abs() < 1e-12);
        assert!((l2_to_cosine(2f64.sqrt()) - 0.0).abs() < 1e-12);
    }
}
