pub mod chat;
pub mod personality;
pub mod recall_memory;
pub mod register;
pub mod timeline;
pub mod vault;

use chat::ChatParams;
use personality::{PersonalityGetParams, PersonalityUpdateParams};
use recall_memory::RecallMemoryParams;
use register::RegisterParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use std::collections::HashMap;
use std::sync::Arc;
use timeline::TimelineParams;
use tokio::sync::Mutex;
use vault::{VaultListParams, VaultStoreParams};

use crate::brain::{Companion, CompanionServices, QuickAction};
use crate::emotion::Emotion;
use crate::memory::search::SearchConfig;
use crate::memory::types::{MemoryKind, NewMemory};
use crate::vault::{Vault, VaultSort};

const MAX_RECALL_RESULTS: usize = 20;

/// One companion per user. The map lock is only held to look up or insert an
/// entry; a chat locks just its own user's companion.
pub type CompanionMap = Arc<Mutex<HashMap<String, Arc<Mutex<Companion>>>>>;

/// The EchoSoul MCP tool handler. Holds the shared services and one
/// [`Companion`] per user that has chatted during this server's lifetime.
#[derive(Clone)]
pub struct EchoTools {
    tool_router: ToolRouter<Self>,
    services: CompanionServices,
    companions: CompanionMap,
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("serialization failed: {e}"))
}

#[tool_router]
impl EchoTools {
    pub fn new(services: CompanionServices) -> Self {
        Self::with_companions(services, Arc::new(Mutex::new(HashMap::new())))
    }

    /// Share one companion map between several handlers (one per HTTP session).
    pub fn with_companions(services: CompanionServices, companions: CompanionMap) -> Self {
        Self {
            tool_router: Self::tool_router(),
            services,
            companions,
        }
    }

    async fn ensure_user(&self, user_id: &str) -> Result<(), String> {
        let id = user_id.to_string();
        let profile = self
            .services
            .with_db(move |conn| Ok(crate::account::get_profile(conn, &id)?))
            .await
            .map_err(|e| format!("profile lookup failed: {e}"))?;
        match profile {
            Some(_) => Ok(()),
            None => Err(format!("unknown user_id {user_id}; call register first")),
        }
    }

    #[tool(description = "Create (or overwrite) an account from an e-mail address. Returns the profile; its 'id' is the user_id for every other tool.")]
    async fn register(
        &self,
        Parameters(params): Parameters<RegisterParams>,
    ) -> Result<String, String> {
        tracing::info!("register called");
        let profile = self
            .services
            .with_db(move |conn| {
                let profile = crate::account::register(
                    conn,
                    &params.email,
                    params.name.as_deref().unwrap_or(""),
                    &params.password,
                    &params.confirm_password,
                )?;
                crate::personality::load_or_create(conn, &profile.id)?;
                Ok(profile)
            })
            .await
            .map_err(|e| e.to_string())?;

        to_json(&profile)
    }

    #[tool(description = "Talk to EchoSoul. Detects the user's emotion, recalls related memories, replies, and remembers the exchange.")]
    async fn chat(&self, Parameters(params): Parameters<ChatParams>) -> Result<String, String> {
        self.ensure_user(&params.user_id).await?;

        let message = match (params.message, params.quick_action) {
            (Some(message), _) => message,
            (None, Some(action)) => action.parse::<QuickAction>()?.prompt().to_string(),
            (None, None) => return Err("either 'message' or 'quick_action' is required".into()),
        };
        tracing::info!(user = %params.user_id, len = message.len(), "chat called");

        let companion = self.companion(&params.user_id).await?;
        let reply = companion
            .lock()
            .await
            .respond(&message, params.context)
            .await
            .map_err(|e| format!("chat failed: {e}"))?;

        to_json(&reply)
    }

    #[tool(description = "Search the user's memories by natural language. Returns ranked results using hybrid vector + keyword search. Vault memories are never included.")]
    async fn recall_memory(
        &self,
        Parameters(params): Parameters<RecallMemoryParams>,
    ) -> Result<String, String> {
        self.ensure_user(&params.user_id).await?;

        let kind = params
            .r#type
            .as_deref()
            .map(str::parse::<MemoryKind>)
            .transpose()?;
        let max_results = params
            .max_results
            .unwrap_or(self.services.config.retrieval.default_max_results);
        if !(1..=MAX_RECALL_RESULTS).contains(&max_results) {
            return Err(format!("max_results must be between 1 and {MAX_RECALL_RESULTS}"));
        }
        if params.query.trim().is_empty() {
            return Err("query must not be empty".into());
        }
        tracing::info!(query = %params.query, max_results, "recall_memory called");

        let embedding = self
            .services
            .embed(params.query.clone())
            .await
            .map_err(|e| format!("embedding failed: {e}"))?;
        let search = SearchConfig {
            max_results,
            rrf_k: self.services.config.retrieval.rrf_k,
        };
        let user_id = params.user_id;
        let query = params.query;
        let memories = self
            .services
            .with_db(move |conn| {
                crate::memory::search::retrieve_memories(
                    conn, &user_id, &embedding, &query, kind, &search,
                )
            })
            .await
            .map_err(|e| format!("recall failed: {e}"))?;

        Ok(serde_json::json!({
            "total": memories.len(),
            "memories": memories,
        })
        .to_string())
    }

    #[tool(description = "The user's memories in chronological order, optionally between two dates (inclusive) and of one type.")]
    async fn timeline(
        &self,
        Parameters(params): Parameters<TimelineParams>,
    ) -> Result<String, String> {
        self.ensure_user(&params.user_id).await?;
        tracing::info!(user = %params.user_id, "timeline called");

        let kind = params
            .r#type
            .as_deref()
            .map(str::parse::<MemoryKind>)
            .transpose()?;
        let entries = self
            .services
            .with_db(move |conn| {
                crate::timeline::get_timeline_data(
                    conn,
                    &params.user_id,
                    params.start_date.as_deref(),
                    params.end_date.as_deref(),
                    kind,
                )
            })
            .await
            .map_err(|e| e.to_string())?;

        Ok(serde_json::json!({
            "total": entries.len(),
            "entries": entries,
        })
        .to_string())
    }

    #[tool(description = "Emotional statistics and insights over the user's timeline, optionally between two dates.")]
    async fn emotion_stats(
        &self,
        Parameters(params): Parameters<TimelineParams>,
    ) -> Result<String, String> {
        self.ensure_user(&params.user_id).await?;
        tracing::info!(user = %params.user_id, "emotion_stats called");

        let kind = params
            .r#type
            .as_deref()
            .map(str::parse::<MemoryKind>)
            .transpose()?;
        let entries = self
            .services
            .with_db(move |conn| {
                crate::timeline::get_timeline_data(
                    conn,
                    &params.user_id,
                    params.start_date.as_deref(),
                    params.end_date.as_deref(),
                    kind,
                )
            })
            .await
            .map_err(|e| e.to_string())?;

        match crate::timeline::emotion_statistics(&entries) {
            Some(stats) => Ok(serde_json::json!({
                "statistics": stats,
                "series": crate::timeline::emotion_series(&entries),
            })
            .to_string()),
            None => Ok(serde_json::json!({
                "total_memories": 0,
                "message": "No memories yet. Start chatting to build your emotional timeline."
            })
            .to_string()),
        }
    }

    #[tool(description = "Encrypt and store a private memory in the user's vault. Vault memories are never searchable by recall.")]
    async fn vault_store(
        &self,
        Parameters(params): Parameters<VaultStoreParams>,
    ) -> Result<String, String> {
        self.ensure_user(&params.user_id).await?;

        let kind = params
            .r#type
            .as_deref()
            .map(str::parse::<MemoryKind>)
            .transpose()?
            .unwrap_or(MemoryKind::Personal);
        let emotion = match params.emotion.as_deref() {
            Some(name) => name.parse::<Emotion>()?,
            None => {
                self.services
                    .analyze(params.content.clone())
                    .await
                    .map_err(|e| e.to_string())?
                    .dominant_emotion
            }
        };

        let mut memory = NewMemory::new(kind, params.content)
            .with_emotion(emotion)
            .with_tags(params.tags.unwrap_or_default());
        memory.title = params.title;

        let mut vault = Vault::from_config(&params.user_id, &self.services.config.vault);
        vault.unlock(&params.password).map_err(|e| e.to_string())?;
        tracing::info!(user = %params.user_id, kind = %kind, "vault_store called");

        let stored = self
            .services
            .with_db(move |conn| Ok(vault.store(conn, memory)?))
            .await
            .map_err(|e| e.to_string())?;

        Ok(serde_json::json!({
            "id": stored.id,
            "title": stored.title,
            "timestamp": stored.timestamp,
            "emotion": stored.emotion,
        })
        .to_string())
    }

    #[tool(description = "Decrypt and list the user's vault memories, optionally filtered by text and sorted.")]
    async fn vault_list(
        &self,
        Parameters(params): Parameters<VaultListParams>,
    ) -> Result<String, String> {
        self.ensure_user(&params.user_id).await?;

        let sort = params
            .sort
            .as_deref()
            .map(str::parse::<VaultSort>)
            .transpose()?
            .unwrap_or_default();
        let mut vault = Vault::from_config(&params.user_id, &self.services.config.vault);
        vault.unlock(&params.password).map_err(|e| e.to_string())?;
        tracing::info!(user = %params.user_id, "vault_list called");

        let query = params.query.unwrap_or_default();
        let memories = self
            .services
            .with_db(move |conn| Ok(vault.search(conn, &query, sort)?))
            .await
            .map_err(|e| e.to_string())?;

        Ok(serde_json::json!({
            "total": memories.len(),
            "memories": memories,
        })
        .to_string())
    }

    #[tool(description = "Show EchoSoul's personality traits for this user, with insights about how they shape replies.")]
    async fn personality_get(
        &self,
        Parameters(params): Parameters<PersonalityGetParams>,
    ) -> Result<String, String> {
        self.ensure_user(&params.user_id).await?;

        let personality = self
            .services
            .with_db(move |conn| crate::personality::load_or_create(conn, &params.user_id))
            .await
            .map_err(|e| e.to_string())?;

        let mut insights = crate::personality::personality_insights(&personality);
        if insights.is_empty() {
            insights.push("Keep chatting to develop more personality insights!".to_string());
        }
        Ok(serde_json::json!({
            "traits": personality,
            "insights": insights,
        })
        .to_string())
    }

    #[tool(description = "Change EchoSoul's personality traits for this user (tone, formality, empathy_level, humor_level, response_length, memory_recall_frequency, name, ...).")]
    async fn personality_update(
        &self,
        Parameters(params): Parameters<PersonalityUpdateParams>,
    ) -> Result<String, String> {
        self.ensure_user(&params.user_id).await?;
        if params.traits.is_empty() {
            return Err("traits must not be empty".into());
        }
        tracing::info!(user = %params.user_id, count = params.traits.len(), "personality_update called");

        let user_id = params.user_id.clone();
        let personality = self
            .services
            .with_db(move |conn| {
                crate::personality::update_traits(conn, &user_id, params.traits)
            })
            .await
            .map_err(|e| e.to_string())?;

        let loaded = self.companions.lock().await.get(&params.user_id).cloned();
        if let Some(companion) = loaded {
            companion
                .lock()
                .await
                .reload_personality()
                .await
                .map_err(|e| e.to_string())?;
        }

        to_json(&personality)
    }
}

impl EchoTools {
    /// The user's companion, started on first use.
    pub async fn companion(&self, user_id: &str) -> Result<Arc<Mutex<Companion>>, String> {
        if let Some(existing) = self.companions.lock().await.get(user_id) {
            return Ok(existing.clone());
        }
        let started = Companion::new(user_id.to_string(), self.services.clone())
            .await
            .map_err(|e| format!("could not start companion: {e}"))?;
        // Another call may have started one meanwhile; the first insert wins.
        let mut companions = self.companions.lock().await;
        let entry = companions
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(started)));
        Ok(entry.clone())
    }
}

#[tool_handler]
impl ServerHandler for EchoTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "EchoSoul is a personal AI companion that remembers. Call register once to get \
                 a user_id, then chat to talk, recall_memory and timeline to look back, \
                 vault_store/vault_list for private memories, and personality_get/update to \
                 shape how EchoSoul speaks."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
