//! CLI `doctor` command: database, model and API diagnostics.

use anyhow::{Context, Result};

use echosoul::config::{expand_tilde, EchoConfig};
use echosoul::db;

/// Run diagnostics and print a health report.
pub fn doctor(config: &EchoConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    println!("EchoSoul Health Report");
    println!("======================");
    println!();

    let embedding_dir = expand_tilde(&config.embedding.cache_dir);
    let model_ok = embedding_dir.join("model.onnx").exists()
        && embedding_dir.join("tokenizer.json").exists();
    println!("Embedding model:   {}", config.embedding.model);
    println!(
        "  Files:           {} ({})",
        if model_ok { "OK" } else { "MISSING" },
        embedding_dir.display()
    );
    if !model_ok {
        println!("  Run `echosoul model download` to fetch it.");
    }

    println!("Emotion provider:  {}", config.emotion.provider);
    if config.emotion.provider == "onnx" {
        let emotion_dir = expand_tilde(&config.emotion.cache_dir);
        let ok = emotion_dir.join("model.onnx").exists()
            && emotion_dir.join("tokenizer.json").exists();
        println!(
            "  Files:           {} ({})",
            if ok { "OK" } else { "MISSING" },
            emotion_dir.display()
        );
    }

    if config.llm_available() {
        println!("Gemini:            configured ({})", config.llm.model);
    } else {
        println!("Gemini:            not configured; replies use the built-in fallback");
        println!("  Set GOOGLE_API_KEY or [llm] api_key to enable it.");
    }
    if config.vault.encryption_key == echosoul::config::VaultConfig::default().encryption_key {
        println!("Vault key:         WARNING default encryption key in use");
    }
    println!();

    if !db_path.exists() {
        println!("Database: not found at {}", db_path.display());
        println!("Run `echosoul register` or `echosoul serve` to initialize.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&db_path)
        .map(|m| m.len())
        .unwrap_or(0);

    let conn = db::open_database(&db_path)
        .context("failed to open database (may be corrupt)")?;

    let report = db::check_database_health(&conn)
        .context("failed to run health check")?;

    println!("Database:          {}", db_path.display());
    println!("File size:         {}", format_bytes(file_size));
    println!("Schema version:    {}", report.schema_version);
    println!("sqlite-vec:        {}", report.sqlite_vec_version);
    if let Some(ref stored) = report.embedding_model {
        if stored != &config.embedding.model {
            println!("  WARNING: memories were embedded with {stored}; recall quality will suffer.");
        }
    }
    println!();
    println!("Row counts:");
    println!("  Users:           {}", report.user_count);
    println!("  Memories:        {}", report.memory_count);
    println!("  Vault entries:   {}", report.vault_count);
    println!("  Audit log:       {}", report.log_count);
    println!();
    if report.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({})", report.integrity_details);
        println!();
        println!("Recovery steps:");
        println!("  1. Restore from a backup: cp backup.db ~/.echosoul/echosoul.db");
        println!("  2. Or export each account from a good copy: echosoul export --email you@example.com");
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
