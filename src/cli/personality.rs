//! CLI `personality show|set|reset` commands.

use anyhow::Result;
use serde_json::Value;

use echosoul::config::EchoConfig;
use echosoul::personality::{self, trait_level, Personality};

/// Traits shown as level bars.
const LEVEL_TRAITS: [(&str, &str); 3] = [
    ("empathy_level", "Empathy"),
    ("curiosity_level", "Curiosity"),
    ("humor_level", "Humor"),
];

fn bar(level: f64) -> String {
    let filled = (level * 10.0).round() as usize;
    format!("{}{}", "#".repeat(filled), "-".repeat(10 - filled.min(10)))
}

fn print_personality(p: &Personality) {
    println!("{}'s Personality", p.name());
    println!("{}", "=".repeat(40));
    println!("  Tone:             {}", p.get_str("tone", "friendly"));
    println!("  Formality:        {}", p.get_str("formality", "casual"));
    println!("  Style:            {}", p.get_str("conversation_style", "reflective"));
    println!("  Response length:  {}", p.get_str("response_length", "medium"));
    for (key, label) in LEVEL_TRAITS {
        let value = p.get_str(key, "medium");
        println!("  {:<17} {} {}", format!("{label}:"), bar(trait_level(value)), value);
    }
    println!(
        "  Memory recall:    {:.0}%",
        p.memory_recall_frequency() * 100.0
    );

    let extra: Vec<(&String, &Value)> = p
        .traits()
        .iter()
        .filter(|(k, _)| {
            !matches!(
                k.as_str(),
                "name"
                    | "tone"
                    | "formality"
                    | "conversation_style"
                    | "response_length"
                    | "empathy_level"
                    | "curiosity_level"
                    | "humor_level"
                    | "memory_recall_frequency"
                    | "emotional_responsiveness"
                    | "created_at"
                    | "last_updated"
            )
        })
        .collect();
    for (key, value) in extra {
        println!("  {key}: {value}");
    }

    println!();
    let insights = personality::personality_insights(p);
    if insights.is_empty() {
        println!("Keep chatting to develop more personality insights!");
    } else {
        for insight in insights {
            println!("  - {insight}");
        }
    }
}

pub fn show(config: &EchoConfig, email: &str) -> Result<()> {
    let conn = super::open_db(config)?;
    let user_id = super::resolve_user(&conn, email)?;
    let p = personality::load_or_create(&conn, &user_id)?;
    print_personality(&p);
    Ok(())
}

pub fn set(config: &EchoConfig, email: &str, assignments: &[String]) -> Result<()> {
    let mut updates = serde_json::Map::new();
    for assignment in assignments {
        let Some((key, raw)) = assignment.split_once('=') else {
            anyhow::bail!("expected TRAIT=VALUE, got {assignment:?}");
        };
        let key = key.trim();
        updates.insert(key.to_string(), personality::parse_trait_value(key, raw.trim())?);
    }
    anyhow::ensure!(!updates.is_empty(), "nothing to set");

    let conn = super::open_db(config)?;
    let user_id = super::resolve_user(&conn, email)?;
    let p = personality::update_traits(&conn, &user_id, updates)?;
    println!("✨ Personality updated! EchoSoul will now respond with these new traits.\n");
    print_personality(&p);
    Ok(())
}

pub fn reset(config: &EchoConfig, email: &str) -> Result<()> {
    let conn = super::open_db(config)?;
    let user_id = super::resolve_user(&conn, email)?;
    let p = personality::reset(&conn, &user_id)?;
    println!("Personality reset to defaults.\n");
    print_personality(&p);
    Ok(())
}
