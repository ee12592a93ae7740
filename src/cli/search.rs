use anyhow::Result;
use std::sync::Arc;

use echosoul::config::EchoConfig;
use echosoul::display::{format_timestamp, truncate_chars};
use echosoul::memory::search::SearchConfig;
use echosoul::memory::types::MemoryKind;

/// Search a user's memories from the terminal.
pub async fn search(
    config: &EchoConfig,
    email: &str,
    query: &str,
    kind: Option<MemoryKind>,
    limit: Option<usize>,
) -> Result<()> {
    let conn = super::open_db(config)?;
    let user_id = super::resolve_user(&conn, email)?;

    let provider = echosoul::embedding::create_provider(&config.embedding)?;
    let embedding_provider: Arc<dyn echosoul::embedding::EmbeddingProvider> = Arc::from(provider);

    let query_text = query.to_string();
    let ep = Arc::clone(&embedding_provider);
    let query_embedding = tokio::task::spawn_blocking(move || ep.embed(&query_text)).await??;

    let search_config = SearchConfig {
        max_results: limit.unwrap_or(config.retrieval.default_max_results),
        rrf_k: config.retrieval.rrf_k,
    };

    let results = echosoul::memory::search::retrieve_memories(
        &conn,
        &user_id,
        &query_embedding,
        query,
        kind,
        &search_config,
    )?;

    if results.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    println!("Found {} result(s)\n", results.len());

    for (i, result) in results.iter().enumerate() {
        let memory = &result.memory;
        println!(
            "  {}. {} [{}] {} (similarity: {:.2}, score: {:.4})",
            i + 1,
            memory.emotion.emoji(),
            memory.kind,
            format_timestamp(&memory.timestamp, "%b %d, %Y"),
            result.similarity,
            result.score,
        );
        println!("     {}", truncate_chars(&memory.content, 120));
        if let Some(response) = &memory.response {
            println!("     Echo: {}", truncate_chars(response, 120));
        }
        println!();
    }

    Ok(())
}
