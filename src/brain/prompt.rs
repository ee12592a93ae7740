//! Prompt assembly and the no-model reply.

use crate::emotion::{Emotion, ResponseStyle};
use crate::memory::search::RecalledMemory;
use crate::personality::Personality;

/// At most this many recalled memories are quoted in a prompt.
pub const PROMPT_MEMORY_LIMIT: usize = 3;

pub const FALLBACK_BODY: &str = "I'm here to listen. Tell me more about how you're feeling.";

pub struct PromptContext<'a> {
    pub user_id: &'a str,
    pub personality: &'a Personality,
    pub memories: &'a [RecalledMemory],
    pub emotion: Emotion,
    pub style: &'a ResponseStyle,
    pub recent_context: &'a str,
    pub input: &'a str,
}

pub fn build_prompt(ctx: &PromptContext<'_>) -> String {
    let personality = serde_json::to_string_pretty(ctx.personality.traits())
        .unwrap_or_else(|_| "{}".to_string());

    let mut prompt = format!(
        "You are EchoSoul, a personal AI companion.\nPersonality: {personality}\nUser: {}\n",
        ctx.user_id
    );

    if !ctx.memories.is_empty() {
        prompt.push_str("\nRelevant past conversations:\n");
        for recalled in ctx.memories.iter().take(PROMPT_MEMORY_LIMIT) {
            prompt.push_str("- ");
            prompt.push_str(&recalled.memory.content);
            prompt.push('\n');
        }
    }

    prompt.push_str(&format!("\nUser's current emotion: {}\n", ctx.emotion));
    prompt.push_str(&format!(
        "\nCurrent conversation context: {}\n",
        ctx.recent_context
    ));
    prompt.push_str(&format!("\nUser says: {}\n", ctx.input));
    prompt.push_str(&format!(
        "\nEchoSoul (responding in a {} tone):",
        ctx.style.tone
    ));
    prompt
}

fn opener(style: &ResponseStyle) -> Option<&'static str> {
    match style.tone.as_str() {
        "enthusiastic" => Some("That's wonderful to hear!"),
        "gentle" => Some("I'm sorry you're going through this."),
        "calm" => Some("Let's take a slow breath together."),
        "neutral" => Some("I hear you."),
        "warm" => Some("That's really lovely."),
        _ => None,
    }
}

/// Deterministic reply used when no model is configured or the call failed.
pub fn fallback_response(style: &ResponseStyle) -> String {
    match opener(style) {
        Some(opener) => format!("{opener} {FALLBACK_BODY}"),
        None => FALLBACK_BODY.to_string(),
    }
}
