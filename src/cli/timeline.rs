//! CLI `timeline` command: chronological entries plus emotional statistics.

use anyhow::Result;

use echosoul::config::EchoConfig;
use echosoul::display::{format_timestamp, DEFAULT_TIMESTAMP_FORMAT};
use echosoul::memory::types::MemoryKind;
use echosoul::timeline::{emotion_series, emotion_statistics, get_timeline_data};

pub fn timeline(
    config: &EchoConfig,
    email: &str,
    start: Option<&str>,
    end: Option<&str>,
    kind: Option<MemoryKind>,
    stats_only: bool,
) -> Result<()> {
    let conn = super::open_db(config)?;
    let user_id = super::resolve_user(&conn, email)?;
    let entries = get_timeline_data(&conn, &user_id, start, end, kind)?;

    let Some(stats) = emotion_statistics(&entries) else {
        println!("No memories yet. Start chatting to build your emotional timeline.");
        return Ok(());
    };

    if !stats_only {
        for entry in &entries {
            println!(
                "{} {}  [{}] {}",
                entry.emotion.emoji(),
                format_timestamp(&entry.timestamp, DEFAULT_TIMESTAMP_FORMAT),
                entry.kind,
                entry.content
            );
        }
        println!();
    }

    println!("Emotional Statistics");
    println!("{}", "=".repeat(40));
    println!("  Memories:            {}", stats.total_memories);
    println!(
        "  Dominant emotion:    {} {}",
        stats.dominant_emotion.emoji(),
        stats.dominant_emotion
    );
    println!(
        "  Diversity:           {:.0}%",
        stats.emotional_diversity * 100.0
    );
    if let Some(day) = &stats.most_emotional_day {
        println!("  Most emotional day:  {day}");
    }
    println!();

    println!("Distribution:");
    for (emotion, count) in &stats.emotion_distribution {
        println!("  {emotion:<12} {count}");
    }

    println!();
    println!("Emotional Journey:");
    for series in emotion_series(&entries) {
        let mut days = series.dates.clone();
        days.dedup();
        println!(
            "  {} {:<12} {:>3}  {}",
            series.emotion.emoji(),
            series.emotion.as_str(),
            series.dates.len(),
            days.join(" ")
        );
    }

    if !stats.insights.is_empty() {
        println!();
        println!("Insights:");
        for insight in &stats.insights {
            println!("  - {insight}");
        }
    }

    Ok(())
}
