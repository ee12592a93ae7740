use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EchoConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub emotion: EmotionConfig,
    pub retrieval: RetrievalConfig,
    pub llm: LlmConfig,
    pub vault: VaultConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub transport: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    pub cache_dir: String,
}

/// Emotion classifier selection. `"lexicon"` needs no model files; `"onnx"`
/// expects an exported sequence-classification model in `cache_dir`.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmotionConfig {
    pub provider: String,
    pub model: String,
    pub cache_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    pub default_max_results: usize,
    pub chat_recall_results: usize,
    pub rrf_k: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct VaultConfig {
    pub encryption_key: String,
    pub password: String,
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            embedding: EmbeddingConfig::default(),
            emotion: EmotionConfig::default(),
            retrieval: RetrievalConfig::default(),
            llm: LlmConfig::default(),
            vault: VaultConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".into(),
            host: "127.0.0.1".into(),
            port: 8787,
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_echosoul_dir()
            .join("echosoul.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let cache_dir = default_echosoul_dir()
            .join("models")
            .to_string_lossy()
            .into_owned();
        Self {
            provider: "local".into(),
            model: "all-MiniLM-L6-v2".into(),
            cache_dir,
        }
    }
}

impl Default for EmotionConfig {
    fn default() -> Self {
        let cache_dir = default_echosoul_dir()
            .join("models")
            .join("emotion")
            .to_string_lossy()
            .into_owned();
        Self {
            provider: "lexicon".into(),
            model: "j-hartmann/emotion-english-distilroberta-base".into(),
            cache_dir,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_max_results: 5,
            chat_recall_results: 3,
            rrf_k: 60,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            model: "gemini-pro".into(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
            temperature: 0.7,
            top_p: 0.8,
            top_k: 40,
            max_output_tokens: 1024,
            timeout_secs: 60,
        }
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            encryption_key: "your-secret-key-here-change-in-production".into(),
            password: "echosoul".into(),
        }
    }
}

/// Returns `~/.echosoul/`
pub fn default_echosoul_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".echosoul")
}

/// Returns the default config file path: `~/.echosoul/config.toml`
pub fn default_config_path() -> PathBuf {
    default_echosoul_dir().join("config.toml")
}

impl EchoConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            EchoConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// `ECHOSOUL_DB`, `ECHOSOUL_LOG_LEVEL`, `GOOGLE_API_KEY`, `GEMINI_MODEL`,
    /// `ECHOSOUL_ENCRYPTION_KEY`, `ECHOSOUL_VAULT_PASSWORD`.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("ECHOSOUL_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("ECHOSOUL_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("GOOGLE_API_KEY") {
            if !val.trim().is_empty() {
                self.llm.api_key = Some(val);
            }
        }
        if let Ok(val) = std::env::var("GEMINI_MODEL") {
            self.llm.model = val;
        }
        if let Ok(val) = std::env::var("ECHOSOUL_ENCRYPTION_KEY") {
            self.vault.encryption_key = val;
        }
        if let Ok(val) = std::env::var("ECHOSOUL_VAULT_PASSWORD") {
            self.vault.password = val;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }

    /// `true` when a Gemini key is configured and the model is enabled.
    pub fn llm_available(&self) -> bool {
        self.llm.enabled
            && self
                .llm
                .api_key
                .as_deref()
                .is_some_and(|k| !k.trim().is_empty())
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}
