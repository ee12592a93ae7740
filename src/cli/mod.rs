pub mod account;
pub mod chat;
pub mod doctor;
pub mod export;
pub mod forget;
pub mod personality;
pub mod reset;
pub mod search;
pub mod stats;
pub mod timeline;
pub mod vault;

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use std::path::Path;
use tokio::io::AsyncWriteExt;

use echosoul::config::EchoConfig;

const MODEL_URL: &str =
    "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main/onnx/model.onnx";
const TOKENIZER_URL: &str =
    "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main/tokenizer.json";

/// Open the configured database.
pub(crate) fn open_db(config: &EchoConfig) -> Result<Connection> {
    echosoul::db::open_database(config.resolved_db_path())
}

/// Map an e-mail to its account id, requiring that the account exists.
pub(crate) fn resolve_user(conn: &Connection, email: &str) -> Result<String> {
    if !echosoul::account::validate_email(email) {
        bail!("invalid e-mail address: {email}");
    }
    let user_id = echosoul::account::generate_user_id(email);
    if echosoul::account::get_profile(conn, &user_id)?.is_none() {
        bail!("no account for {email}; run `echosoul register` first");
    }
    Ok(user_id)
}

/// Download the ONNX embedding model and tokenizer to the cache directory.
pub async fn model_download(config: &echosoul::config::EmbeddingConfig) -> Result<()> {
    let cache_dir = echosoul::config::expand_tilde(&config.cache_dir);
    std::fs::create_dir_all(&cache_dir)
        .with_context(|| format!("failed to create cache dir: {}", cache_dir.display()))?;

    let model_path = cache_dir.join("model.onnx");
    let tokenizer_path = cache_dir.join("tokenizer.json");

    if model_path.exists() {
        println!("Model already exists at {}", model_path.display());
    } else {
        println!("Downloading model.onnx (~90MB)...");
        download_file(MODEL_URL, &model_path).await?;
        println!("Model saved to {}", model_path.display());
    }

    if tokenizer_path.exists() {
        println!("Tokenizer already exists at {}", tokenizer_path.display());
    } else {
        println!("Downloading tokenizer.json...");
        download_file(TOKENIZER_URL, &tokenizer_path).await?;
        println!("Tokenizer saved to {}", tokenizer_path.display());
    }

    println!("Embedding model ready.");
    println!(
        "For ONNX emotion detection, export a sequence-classification model \
         (model.onnx, tokenizer.json, config.json) into the [emotion] cache_dir \
         and set provider = \"onnx\"."
    );
    Ok(())
}

/// Download a file with a progress bar, writing to a temp file first.
async fn download_file(url: &str, dest: &Path) -> Result<()> {
    let mut response = reqwest::get(url)
        .await
        .with_context(|| format!("HTTP request failed for {url}"))?;

    anyhow::ensure!(
        response.status().is_success(),
        "download failed with HTTP {}",
        response.status()
    );

    let pb = match response.content_length() {
        Some(size) => {
            let pb = ProgressBar::new(size);
            let style = ProgressStyle::default_bar()
                .template("  {bar:40.cyan/blue} {bytes}/{total_bytes} ({eta})")
                .context("invalid progress template")?
                .progress_chars("##-");
            pb.set_style(style);
            pb
        }
        None => ProgressBar::new_spinner(),
    };

    let tmp_path = dest.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp_path)
        .await
        .with_context(|| format!("failed to create temp file: {}", tmp_path.display()))?;

    while let Some(chunk) = response.chunk().await.context("error reading response")? {
        file.write_all(&chunk)
            .await
            .context("error writing to file")?;
        pb.inc(chunk.len() as u64);
    }

    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp_path, dest)
        .await
        .context("failed to rename temp file")?;

    pb.finish_and_clear();
    Ok(())
}
