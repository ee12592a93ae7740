//! The companion's persisted personality.
//!
//! Stored per user as a free-form JSON object in `personalities`. Known traits
//! have typed accessors with the same fallbacks used when a trait is missing;
//! any other key is carried along untouched.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use serde_json::{json, Map, Value};

pub const DEFAULT_NAME: &str = "Echo";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Personality {
    traits: Map<String, Value>,
}

impl Personality {
    /// The personality every new user starts with.
    pub fn defaults() -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        let value = json!({
            "name": DEFAULT_NAME,
            "tone": "friendly",
            "formality": "casual",
            "empathy_level": "high",
            "humor_level": "medium",
            "curiosity_level": "high",
            "memory_recall_frequency": 0.3,
            "emotional_responsiveness": "adaptive",
            "conversation_style": "reflective",
            "response_length": "medium",
            "created_at": now,
            "last_updated": now,
        });
        Self {
            traits: value.as_object().cloned().unwrap_or_default(),
        }
    }

    pub fn from_map(traits: Map<String, Value>) -> Self {
        Self { traits }
    }

    pub fn traits(&self) -> &Map<String, Value> {
        &self.traits
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.traits.get(key)
    }

    /// String trait, or `default` when missing or not a string.
    pub fn get_str<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.traits
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or(default)
    }

    pub fn name(&self) -> &str {
        self.get_str("name", DEFAULT_NAME)
    }

    pub fn tone(&self) -> &str {
        self.get_str("tone", "friendly")
    }

    pub fn memory_recall_frequency(&self) -> f64 {
        self.traits
            .get("memory_recall_frequency")
            .and_then(Value::as_f64)
            .unwrap_or(0.3)
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.traits.insert(key.to_string(), value);
    }

    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.traits)?)
    }
}

/// Load the stored personality, if any.
pub fn load(conn: &Connection, user_id: &str) -> Result<Option<Personality>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT traits FROM personalities WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )
        .optional()?;

    raw.map(|s| {
        serde_json::from_str::<Map<String, Value>>(&s)
            .map(Personality::from_map)
            .with_context(|| format!("corrupt personality record for {user_id}"))
    })
    .transpose()
}

fn save(conn: &Connection, user_id: &str, personality: &Personality) -> Result<()> {
    conn.execute(
        "INSERT INTO personalities (user_id, traits, updated_at) VALUES (?1, ?2, ?3) \
         ON CONFLICT(user_id) DO UPDATE SET traits = excluded.traits, updated_at = excluded.updated_at",
        params![
            user_id,
            serde_json::to_string(&personality.traits)?,
            chrono::Utc::now().to_rfc3339()
        ],
    )?;
    Ok(())
}

/// Load the personality, creating and saving the defaults on first use.
pub fn load_or_create(conn: &Connection, user_id: &str) -> Result<Personality> {
    if let Some(personality) = load(conn, user_id)? {
        return Ok(personality);
    }
    let personality = Personality::defaults();
    save(conn, user_id, &personality)?;
    tracing::info!(user = user_id, "created default personality");
    Ok(personality)
}

/// Set one trait. A user without a record gets a record holding only this trait.
pub fn update_trait(
    conn: &Connection,
    user_id: &str,
    trait_name: &str,
    value: Value,
) -> Result<Personality> {
    let mut personality =
        load(conn, user_id)?.unwrap_or_else(|| Personality::from_map(Map::new()));
    personality.set(trait_name, value);
    save(conn, user_id, &personality)?;
    Ok(personality)
}

/// Set several traits at once and stamp `last_updated`.
pub fn update_traits(
    conn: &Connection,
    user_id: &str,
    updates: Map<String, Value>,
) -> Result<Personality> {
    let mut personality = load_or_create(conn, user_id)?;
    for (key, value) in updates {
        personality.set(&key, value);
    }
    personality.set("last_updated", Value::String(chrono::Utc::now().to_rfc3339()));
    save(conn, user_id, &personality)?;
    Ok(personality)
}

/// Replace the stored personality with fresh defaults.
pub fn reset(conn: &Connection, user_id: &str) -> Result<Personality> {
    let personality = Personality::defaults();
    save(conn, user_id, &personality)?;
    Ok(personality)
}

/// Observations about how the configured personality will behave.
pub fn personality_insights(personality: &Personality) -> Vec<String> {
    let mut insights = Vec::new();
    if personality.get_str("empathy_level", "") == "very_high" {
        insights.push("Your EchoSoul is highly empathetic, great for emotional support!".to_string());
    }
    if matches!(personality.get_str("humor_level", ""), "medium" | "high") {
        insights.push("EchoSoul incorporates humor in conversations.".to_string());
    }
    let recall = personality
        .get("memory_recall_frequency")
        .and_then(Value::as_f64)
        .unwrap_or(0.0);
    if recall > 0.5 {
        insights.push(
            "EchoSoul frequently references past conversations, showing strong memory recall."
                .to_string(),
        );
    }
    insights
}

/// Choices accepted for the enumerated traits.
pub const TRAIT_OPTIONS: &[(&str, &[&str])] = &[
    (
        "tone",
        &["professional", "serious", "balanced", "friendly", "warm", "playful"],
    ),
    ("empathy_level", &["low", "medium", "high", "very_high"]),
    ("humor_level", &["none", "low", "medium", "high"]),
    (
        "formality",
        &["very_formal", "formal", "balanced", "casual", "very_casual"],
    ),
    ("response_length", &["concise", "medium", "detailed"]),
];

pub fn trait_options(name: &str) -> Option<&'static [&'static str]> {
    TRAIT_OPTIONS
        .iter()
        .find(|(trait_name, _)| *trait_name == name)
        .map(|(_, options)| *options)
}

/// Turn a command-line value into the JSON stored for `name`.
///
/// Enumerated traits must use one of their options and
/// `memory_recall_frequency` must be a number in `[0, 1]`. Anything else is
/// stored as a string.
pub fn parse_trait_value(name: &str, raw: &str) -> Result<Value> {
    if let Some(options) = trait_options(name) {
        anyhow::ensure!(
            options.contains(&raw),
            "invalid {name} {raw:?}; expected one of {}",
            options.join(", ")
        );
        return Ok(Value::String(raw.to_string()));
    }
    if name == "memory_recall_frequency" {
        let freq: f64 = raw
            .parse()
            .with_context(|| format!("memory_recall_frequency must be a number, got {raw:?}"))?;
        anyhow::ensure!(
            (0.0..=1.0).contains(&freq),
            "memory_recall_frequency must be between 0 and 1"
        );
        return Ok(json!(freq));
    }
    Ok(Value::String(raw.to_string()))
}

/// Level of a graded trait value in `[0.0, 1.0]`; unknown values are 0.5.
pub fn trait_level(value: &str) -> f64 {
    match value.to_lowercase().as_str() {
        "none" => 0.0,
        "low" => 0.25,
        "medium" => 0.5,
        "high" => 0.75,
        "very_high" => 1.0,
        _ => 0.5,
    }
}
