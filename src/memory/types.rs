//! Core memory type definitions.
//!
//! Defines [`MemoryKind`] (what a memory records), [`NewMemory`] (the caller
//! supplied fields of a write), and [`Memory`] (a full stored record, which is
//! also the plaintext payload of a vault entry).

use serde::{Deserialize, Serialize};

use crate::emotion::{Emotion, EmotionAnalysis, ResponseStyle};

/// What a memory records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    /// One user message and the companion's reply.
    Conversation,
    Personal,
    Secret,
    Dream,
    Goal,
    Reflection,
    Confession,
}

impl MemoryKind {
    pub const ALL: [MemoryKind; 7] = [
        Self::Conversation,
        Self::Personal,
        Self::Secret,
        Self::Dream,
        Self::Goal,
        Self::Reflection,
        Self::Confession,
    ];

    /// SQL-compatible string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conversation => "conversation",
            Self::Personal => "personal",
            Self::Secret => "secret",
            Self::Dream => "dream",
            Self::Goal => "goal",
            Self::Reflection => "reflection",
            Self::Confession => "confession",
        }
    }
}

impl std::fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MemoryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown memory kind: {s}"))
    }
}

/// Fields supplied by the caller when writing a memory. Identity, owner and
/// timestamp are stamped by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMemory {
    #[serde(rename = "type")]
    pub kind: MemoryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    pub emotion: Emotion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion_details: Option<EmotionAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_style: Option<ResponseStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewMemory {
    pub fn new(kind: MemoryKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            title: None,
            content: content.into(),
            response: None,
            emotion: Emotion::Neutral,
            emotion_details: None,
            response_style: None,
            context: None,
            tags: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_emotion(mut self, emotion: Emotion) -> Self {
        self.emotion = emotion;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Text fed to the embedding model: title, content and emotion, space separated.
    pub fn embedding_text(&self) -> String {
        format!(
            "{} {} {}",
            self.title.as_deref().unwrap_or(""),
            self.content,
            self.emotion
        )
    }
}

/// A stored memory record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    /// UUID v7 (time-sortable) primary key.
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: MemoryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    pub emotion: Emotion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion_details: Option<EmotionAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_style: Option<ResponseStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// RFC 3339 creation timestamp.
    pub timestamp: String,
    /// `true` only for vault entries.
    #[serde(default)]
    pub encrypted: bool,
}

impl Memory {
    /// Stamp a [`NewMemory`] with an id, owner and timestamp.
    pub fn from_new(new: NewMemory, id: String, user_id: &str, timestamp: String) -> Self {
        Self {
            id,
            user_id: user_id.to_string(),
            kind: new.kind,
            title: new.title,
            content: new.content,
            response: new.response,
            emotion: new.emotion,
            emotion_details: new.emotion_details,
            response_style: new.response_style,
            context: new.context,
            tags: new.tags,
            timestamp,
            encrypted: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_every_variant() {
        for kind in MemoryKind::ALL {
            assert_eq!(kind.as_str().parse::<MemoryKind>().unwrap(), kind);
        }
        assert!("diary".parse::<MemoryKind>().is_err());
    }

    #[test]
    fn embedding_text_joins_title_content_emotion() {
        let memory = NewMemory::new(MemoryKind::Dream, "I was flying over the sea")
            .with_title("Flight")
            .with_emotion(Emotion::Joy);
        assert_eq!(memory.embedding_text(), "Flight I was flying over the sea joy");

        let untitled = NewMemory::new(MemoryKind::Conversation, "hello");
        assert_eq!(untitled.embedding_text(), " hello neutral");
    }

    #[test]
    fn memory_json_uses_type_key() {
        let memory = Memory::from_new(
            NewMemory::new(MemoryKind::Goal, "Run a marathon"),
            "m1".into(),
            "u1",
            "2024-05-01T10:00:00+00:00".into(),
        );
        let json = serde_json::to_value(&memory).unwrap();
        assert_eq!(json["type"], "goal");
        assert_eq!(json["encrypted"], false);
        assert!(json.get("title").is_none());

        let back: Memory = serde_json::from_value(json).unwrap();
        assert_eq!(back, memory);
    }
}
