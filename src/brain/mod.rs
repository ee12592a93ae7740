//! The chat pipeline: one [`Companion`] per signed-in user.
//!
//! A turn reads the user's emotion, recalls related memories, asks Gemini for a
//! reply (or falls back to a fixed one), and stores the exchange as a new
//! `conversation` memory.

pub mod prompt;

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex};

use crate::config::EchoConfig;
use crate::embedding::{self, EmbeddingProvider};
use crate::emotion::{
    self, conversation_pattern, response_style, Emotion, EmotionAnalysis, EmotionAnalyzer,
    MoodTrend, ResponseStyle,
};
use crate::llm::GeminiClient;
use crate::memory::search::{retrieve_memories, RecalledMemory, SearchConfig};
use crate::memory::types::{MemoryKind, NewMemory};
use crate::personality::{self, Personality};
use prompt::{build_prompt, fallback_response, PromptContext};

/// Memories returned alongside a reply.
pub const REPLY_MEMORY_LIMIT: usize = 2;

/// Everything a companion needs that is shared between users.
#[derive(Clone)]
pub struct CompanionServices {
    pub db: Arc<Mutex<Connection>>,
    pub embedding: Arc<dyn EmbeddingProvider>,
    pub analyzer: Arc<EmotionAnalyzer>,
    pub llm: Option<GeminiClient>,
    pub config: Arc<EchoConfig>,
}

impl CompanionServices {
    /// Open the database and load the embedding and emotion models.
    pub fn from_config(config: EchoConfig) -> Result<Self> {
        let db_path = config.resolved_db_path();
        let conn = crate::db::open_database(&db_path)?;
        tracing::info!(db = %db_path.display(), "database ready");

        match crate::db::migrations::get_embedding_model(&conn)? {
            Some(stored_model) if stored_model != config.embedding.model => tracing::warn!(
                stored = %stored_model,
                configured = %config.embedding.model,
                "embedding model changed; existing memories were embedded with another model"
            ),
            Some(_) => {}
            None => crate::db::migrations::set_embedding_model(&conn, &config.embedding.model)?,
        }

        let embedding: Arc<dyn EmbeddingProvider> =
            Arc::from(embedding::create_provider(&config.embedding)?);
        tracing::info!("embedding provider ready");

        let analyzer = Arc::new(EmotionAnalyzer::new(emotion::create_classifier(
            &config.emotion,
        )?));
        tracing::info!(provider = %config.emotion.provider, "emotion classifier ready");

        let llm = GeminiClient::from_config(&config.llm);
        match &llm {
            Some(client) => tracing::info!(model = client.model(), "Gemini enabled"),
            None => tracing::warn!("Gemini not configured; using fallback replies"),
        }

        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
            embedding,
            analyzer,
            llm,
            config: Arc::new(config),
        })
    }

    /// Run `f` with the database locked, on the blocking pool.
    pub async fn with_db<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let mut conn = db
                .lock()
                .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
            f(&mut conn)
        })
        .await
        .context("db task failed")?
    }

    pub async fn embed(&self, text: String) -> Result<Vec<f32>> {
        let provider = Arc::clone(&self.embedding);
        tokio::task::spawn_blocking(move || provider.embed(&text))
            .await
            .context("embedding task failed")?
    }

    pub async fn analyze(&self, text: String) -> Result<EmotionAnalysis> {
        let analyzer = Arc::clone(&self.analyzer);
        tokio::task::spawn_blocking(move || analyzer.analyze_text(&text))
            .await
            .context("emotion task failed")
    }
}

/// One exchange in the in-session history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub user: String,
    pub echo: String,
    pub emotion: Emotion,
    pub timestamp: String,
    pub memory_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub response: String,
    pub emotion_analysis: EmotionAnalysis,
    pub response_style: ResponseStyle,
    pub memory_id: String,
    pub relevant_memories: Vec<RecalledMemory>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationSummary {
    pub total_conversations: usize,
    pub emotion_trend: MoodTrend,
    pub dominant_emotion_pattern: Emotion,
    pub recent_emotions: Vec<Emotion>,
}

/// Canned openers offered by the chat surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuickAction {
    Recall,
    Checkin,
    Story,
}

impl QuickAction {
    pub fn prompt(&self) -> &'static str {
        match self {
            Self::Recall => "Can you remember something I told you before?",
            Self::Checkin => "Let's do a daily check-in. How am I doing emotionally?",
            Self::Story => "I want to share an important story from my life.",
        }
    }
}

impl std::str::FromStr for QuickAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "recall" => Ok(Self::Recall),
            "checkin" | "check-in" => Ok(Self::Checkin),
            "story" => Ok(Self::Story),
            _ => Err(format!("unknown quick action: {s} (expected recall, checkin, story)")),
        }
    }
}

pub struct Companion {
    user_id: String,
    services: CompanionServices,
    personality: Personality,
    history: Vec<Turn>,
}

impl Companion {
    pub async fn new(user_id: impl Into<String>, services: CompanionServices) -> Result<Self> {
        let user_id = user_id.into();
        let owner = user_id.clone();
        let personality = services
            .with_db(move |conn| personality::load_or_create(conn, &owner))
            .await?;
        Ok(Self {
            user_id,
            services,
            personality,
            history: Vec::new(),
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn personality(&self) -> &Personality {
        &self.personality
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// Re-read the personality after it was edited elsewhere.
    pub async fn reload_personality(&mut self) -> Result<()> {
        let owner = self.user_id.clone();
        self.personality = self
            .services
            .with_db(move |conn| personality::load_or_create(conn, &owner))
            .await?;
        Ok(())
    }

    /// The last two exchanges as `User:`/`Echo:` lines; empty until there are two.
    pub fn recent_context(&self) -> String {
        if self.history.len() < 2 {
            return String::new();
        }
        self.history[self.history.len() - 2..]
            .iter()
            .map(|turn| format!("User: {}\nEcho: {}\n", turn.user, turn.echo))
            .collect()
    }

    pub fn conversation_summary(&self, num_messages: usize) -> ConversationSummary {
        let start = self.history.len().saturating_sub(num_messages);
        let emotions: Vec<Emotion> = self.history[start..].iter().map(|t| t.emotion).collect();
        let pattern = conversation_pattern(&emotions);
        ConversationSummary {
            total_conversations: self.history.len(),
            emotion_trend: pattern.mood_trend,
            dominant_emotion_pattern: pattern.dominant_pattern,
            recent_emotions: emotions,
        }
    }

    /// Handle one user message end to end.
    pub async fn respond(&mut self, input: &str, context: Option<Value>) -> Result<ChatReply> {
        anyhow::ensure!(!input.trim().is_empty(), "message must not be empty");

        let analysis = self.services.analyze(input.to_string()).await?;
        let emotion = analysis.dominant_emotion;
        tracing::debug!(
            emotion = %emotion,
            confidence = analysis.confidence,
            "analyzed message"
        );

        let query_embedding = self.services.embed(input.to_string()).await?;
        let search = SearchConfig {
            max_results: self.services.config.retrieval.chat_recall_results,
            rrf_k: self.services.config.retrieval.rrf_k,
        };
        let owner = self.user_id.clone();
        let query = input.to_string();
        let recalled = self
            .services
            .with_db(move |conn| {
                retrieve_memories(conn, &owner, &query_embedding, &query, None, &search)
            })
            .await?;

        let style = response_style(emotion);
        let recent = self.recent_context();
        let prompt = build_prompt(&PromptContext {
            user_id: &self.user_id,
            personality: &self.personality,
            memories: &recalled,
            emotion,
            style: &style,
            recent_context: &recent,
            input,
        });

        let response = match &self.services.llm {
            Some(client) => match client.generate(&prompt).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(error = %e, "Gemini call failed; using fallback reply");
                    fallback_response(&style)
                }
            },
            None => fallback_response(&style),
        };

        let mut record = NewMemory::new(MemoryKind::Conversation, input).with_emotion(emotion);
        record.response = Some(response.clone());
        record.emotion_details = Some(analysis.clone());
        record.response_style = Some(style.clone());
        record.context = context;

        let memory_embedding = self.services.embed(record.embedding_text()).await?;
        let owner = self.user_id.clone();
        let stored = self
            .services
            .with_db(move |conn| {
                crate::memory::store::store_memory(conn, &owner, record, &memory_embedding)
            })
            .await?;
        tracing::info!(id = %stored.id, emotion = %emotion, "conversation stored");

        self.history.push(Turn {
            user: input.to_string(),
            echo: response.clone(),
            emotion,
            timestamp: stored.timestamp.clone(),
            memory_id: stored.id.clone(),
        });

        Ok(ChatReply {
            response,
            emotion_analysis: analysis,
            response_style: style,
            memory_id: stored.id,
            relevant_memories: recalled.into_iter().take(REPLY_MEMORY_LIMIT).collect(),
        })
    }

    pub async fn quick_action(&mut self, action: QuickAction) -> Result<ChatReply> {
        self.respond(action.prompt(), None).await
    }
}
