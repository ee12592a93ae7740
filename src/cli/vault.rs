//! CLI `vault add|list|delete` commands.

use anyhow::Result;
use std::io::Write;

use echosoul::config::EchoConfig;
use echosoul::display::{format_timestamp, DEFAULT_TIMESTAMP_FORMAT};
use echosoul::emotion::{Emotion, EmotionAnalyzer};
use echosoul::memory::types::{MemoryKind, NewMemory};
use echosoul::vault::{Vault, VaultSort};

fn unlock(config: &EchoConfig, user_id: &str, password: Option<String>) -> Result<Vault> {
    let password = match password {
        Some(p) => p,
        None => {
            print!("Vault password: ");
            std::io::stdout().flush()?;
            let mut input = String::new();
            std::io::stdin().read_line(&mut input)?;
            input.trim_end_matches(['\r', '\n']).to_string()
        }
    };
    let mut vault = Vault::from_config(user_id, &config.vault);
    vault.unlock(&password)?;
    Ok(vault)
}

pub struct AddArgs {
    pub title: Option<String>,
    pub content: String,
    pub kind: MemoryKind,
    pub emotion: Option<Emotion>,
    pub tags: Vec<String>,
}

pub fn add(config: &EchoConfig, email: &str, password: Option<String>, args: AddArgs) -> Result<()> {
    let conn = super::open_db(config)?;
    let user_id = super::resolve_user(&conn, email)?;
    let vault = unlock(config, &user_id, password)?;

    let emotion = match args.emotion {
        Some(emotion) => emotion,
        None => {
            let analyzer =
                EmotionAnalyzer::new(echosoul::emotion::create_classifier(&config.emotion)?);
            analyzer.analyze_text(&args.content).dominant_emotion
        }
    };

    let mut memory = NewMemory::new(args.kind, args.content)
        .with_emotion(emotion)
        .with_tags(args.tags);
    memory.title = args.title;

    let stored = vault.store(&conn, memory)?;
    println!("🔐 Memory saved to vault securely!");
    println!("  Id:       {}", stored.id);
    println!("  Title:    {}", stored.title.as_deref().unwrap_or_default());
    println!("  Emotion:  {} {}", stored.emotion.emoji(), stored.emotion);
    Ok(())
}

pub fn list(
    config: &EchoConfig,
    email: &str,
    password: Option<String>,
    query: Option<&str>,
    sort: VaultSort,
) -> Result<()> {
    let conn = super::open_db(config)?;
    let user_id = super::resolve_user(&conn, email)?;
    let vault = unlock(config, &user_id, password)?;

    let memories = vault.search(&conn, query.unwrap_or(""), sort)?;
    if memories.is_empty() {
        println!("Your vault is empty.");
        return Ok(());
    }

    println!("Found {} vault memor{}\n", memories.len(), if memories.len() == 1 { "y" } else { "ies" });
    for memory in &memories {
        println!(
            "{} {}  ({})",
            memory.emotion.emoji(),
            memory.title.as_deref().unwrap_or_default(),
            format_timestamp(&memory.timestamp, DEFAULT_TIMESTAMP_FORMAT)
        );
        println!("   id: {}  type: {}", memory.id, memory.kind);
        println!("   {}", memory.content);
        if !memory.tags.is_empty() {
            println!("   tags: {}", memory.tags.join(", "));
        }
        println!();
    }
    Ok(())
}

pub fn delete(config: &EchoConfig, email: &str, password: Option<String>, id: &str) -> Result<()> {
    let conn = super::open_db(config)?;
    let user_id = super::resolve_user(&conn, email)?;
    let vault = unlock(config, &user_id, password)?;

    vault.delete(&conn, id)?;
    println!("Vault memory {id} deleted.");
    Ok(())
}
