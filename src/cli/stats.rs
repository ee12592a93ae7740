use anyhow::Result;

use echosoul::config::EchoConfig;
use echosoul::memory::types::MemoryKind;

/// Display memory statistics, for one user or the whole database.
pub fn stats(config: &EchoConfig, email: Option<&str>) -> Result<()> {
    let db_path = config.resolved_db_path();
    let conn = super::open_db(config)?;

    let user_id = email.map(|e| super::resolve_user(&conn, e)).transpose()?;
    let response =
        echosoul::memory::stats::memory_stats(&conn, user_id.as_deref(), Some(&db_path))?;

    println!("Memory Statistics");
    println!("{}", "=".repeat(40));
    println!("  Total memories:      {}", response.total_memories);
    println!("  Vault entries:       {}", response.vault_entries);
    println!();

    println!("By Type:");
    for kind in MemoryKind::ALL {
        let count = response.by_kind.get(kind.as_str()).copied().unwrap_or(0);
        println!("  {:<12} {}", kind.as_str(), count);
    }
    println!();

    if !response.by_emotion.is_empty() {
        println!("By Emotion:");
        for (emotion, count) in &response.by_emotion {
            println!("  {:<12} {}", emotion, count);
        }
        println!();
    }

    println!("Database size:         {} bytes", response.db_size_bytes);

    if let Some(ref oldest) = response.oldest_memory {
        println!("Oldest memory:         {oldest}");
    }
    if let Some(ref newest) = response.newest_memory {
        println!("Newest memory:         {newest}");
    }

    Ok(())
}
