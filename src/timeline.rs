//! Emotional timeline: per-memory entries, aggregate statistics, and insights.

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::display::truncate_chars;
use crate::emotion::{Emotion, EmotionAnalysis, ResponseStyle};
use crate::memory::types::{Memory, MemoryKind};

/// Characters of content kept in [`TimelineEntry::content`].
const PREVIEW_CHARS: usize = 100;
/// Denominator for emotional diversity: the emotions the timeline tracks.
const TRACKED_EMOTIONS: usize = 11;
/// Entries considered for the recent-trend insight.
const RECENT_WINDOW: usize = 10;
const MAX_INSIGHTS: usize = 3;

const POSITIVE: [Emotion; 5] = [
    Emotion::Joy,
    Emotion::Love,
    Emotion::Excitement,
    Emotion::Contentment,
    Emotion::Surprise,
];
const NEGATIVE: [Emotion; 5] = [
    Emotion::Sadness,
    Emotion::Anger,
    Emotion::Fear,
    Emotion::Anxiety,
    Emotion::Stress,
];

#[derive(Debug, Clone, Serialize)]
pub struct TimelineEntry {
    pub id: String,
    pub timestamp: String,
    /// `YYYY-MM-DD` prefix of the timestamp.
    pub date: String,
    #[serde(rename = "type")]
    pub kind: MemoryKind,
    /// Content preview.
    pub content: String,
    pub emotion: Emotion,
    pub full_content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_style: Option<ResponseStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotion_details: Option<EmotionAnalysis>,
}

impl From<Memory> for TimelineEntry {
    fn from(memory: Memory) -> Self {
        Self {
            date: memory.timestamp.chars().take(10).collect(),
            content: truncate_chars(&memory.content, PREVIEW_CHARS),
            id: memory.id,
            timestamp: memory.timestamp,
            kind: memory.kind,
            emotion: memory.emotion,
            full_content: memory.content,
            response_style: memory.response_style,
            emotion_details: memory.emotion_details,
        }
    }
}

/// Timeline entries for the user within an optional inclusive range, oldest
/// first. `kind` narrows them to one memory kind.
pub fn get_timeline_data(
    conn: &Connection,
    user_id: &str,
    start: Option<&str>,
    end: Option<&str>,
    kind: Option<MemoryKind>,
) -> Result<Vec<TimelineEntry>> {
    let memories = crate::memory::timeline::get_timeline(conn, user_id, start, end, kind)?;
    Ok(memories.into_iter().map(TimelineEntry::from).collect())
}

#[derive(Debug, Clone, Serialize)]
pub struct EmotionStatistics {
    pub total_memories: usize,
    pub emotion_distribution: BTreeMap<String, usize>,
    pub dominant_emotion: Emotion,
    /// Memory kind → emotion → count.
    pub emotion_by_type: BTreeMap<String, BTreeMap<String, usize>>,
    /// Weekday name with the most entries, e.g. `"Monday"`.
    pub most_emotional_day: Option<String>,
    pub emotional_diversity: f64,
    pub insights: Vec<String>,
}

/// Emotion counts in order of first appearance.
fn count_emotions(entries: &[TimelineEntry]) -> Vec<(Emotion, usize)> {
    let mut counts: Vec<(Emotion, usize)> = Vec::new();
    for entry in entries {
        match counts.iter_mut().find(|(e, _)| *e == entry.emotion) {
            Some((_, n)) => *n += 1,
            None => counts.push((entry.emotion, 1)),
        }
    }
    counts
}

/// First emotion reaching the highest count.
fn top_emotion(counts: &[(Emotion, usize)]) -> Option<(Emotion, usize)> {
    let mut best: Option<(Emotion, usize)> = None;
    for &(emotion, n) in counts {
        if best.map_or(true, |(_, b)| n > b) {
            best = Some((emotion, n));
        }
    }
    best
}

/// Aggregate statistics over timeline entries. `None` when there are no entries.
pub fn emotion_statistics(entries: &[TimelineEntry]) -> Option<EmotionStatistics> {
    if entries.is_empty() {
        return None;
    }

    let counts = count_emotions(entries);
    let (dominant_emotion, _) = top_emotion(&counts)?;

    let mut emotion_by_type: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
    for entry in entries {
        *emotion_by_type
            .entry(entry.kind.as_str().to_string())
            .or_default()
            .entry(entry.emotion.as_str().to_string())
            .or_default() += 1;
    }

    // weekday totals in order of first appearance; the first to reach the max wins
    let mut days: Vec<(chrono::Weekday, usize)> = Vec::new();
    for entry in entries {
        let Ok(date) = NaiveDate::parse_from_str(&entry.date, "%Y-%m-%d") else {
            continue;
        };
        let day = date.weekday();
        match days.iter_mut().find(|(d, _)| *d == day) {
            Some((_, n)) => *n += 1,
            None => days.push((day, 1)),
        }
    }
    let mut most_emotional_day = None;
    let mut max_entries = 0;
    for (day, n) in days {
        if n > max_entries {
            max_entries = n;
            most_emotional_day = Some(weekday_name(day).to_string());
        }
    }

    Some(EmotionStatistics {
        total_memories: entries.len(),
        emotion_distribution: counts
            .iter()
            .map(|(e, n)| (e.as_str().to_string(), *n))
            .collect(),
        dominant_emotion,
        emotion_by_type,
        most_emotional_day,
        emotional_diversity: counts.len() as f64 / TRACKED_EMOTIONS as f64,
        insights: generate_insights(&counts, entries),
    })
}

fn weekday_name(day: chrono::Weekday) -> &'static str {
    match day {
        chrono::Weekday::Mon => "Monday",
        chrono::Weekday::Tue => "Tuesday",
        chrono::Weekday::Wed => "Wednesday",
        chrono::Weekday::Thu => "Thursday",
        chrono::Weekday::Fri => "Friday",
        chrono::Weekday::Sat => "Saturday",
        chrono::Weekday::Sun => "Sunday",
    }
}

/// Up to three plain-language observations about the user's emotions.
pub fn generate_insights(counts: &[(Emotion, usize)], entries: &[TimelineEntry]) -> Vec<String> {
    let total: usize = counts.iter().map(|(_, n)| n).sum();
    if total == 0 {
        return vec!["No data available yet".to_string()];
    }

    let mut insights = Vec::new();

    if let Some((emotion, n)) = top_emotion(counts) {
        let percentage = n as f64 / total as f64 * 100.0;
        insights.push(format!(
            "You most frequently experience {emotion} ({percentage:.1}% of memories)"
        ));
    }

    let unique = counts.len();
    if unique >= 8 {
        insights.push("You express a wide range of emotions, showing emotional diversity".into());
    } else if unique <= 3 {
        insights.push("Your emotional expressions tend to focus on a few core feelings".into());
    }

    let tally = |set: &[Emotion]| -> usize {
        counts
            .iter()
            .filter(|(e, _)| set.contains(e))
            .map(|(_, n)| n)
            .sum()
    };
    let positive = tally(&POSITIVE) as f64;
    let negative = tally(&NEGATIVE) as f64;
    if positive > negative * 1.5 {
        insights.push("Your memories lean toward positive experiences".into());
    } else if negative > positive * 1.5 {
        insights.push("You've been processing more challenging emotions lately".into());
    } else {
        insights.push("You maintain a balanced emotional perspective".into());
    }

    if entries.len() >= RECENT_WINDOW {
        let recent = &entries[entries.len() - RECENT_WINDOW..];
        let recent_pos = recent.iter().filter(|e| POSITIVE.contains(&e.emotion)).count();
        let recent_neg = recent.iter().filter(|e| NEGATIVE.contains(&e.emotion)).count();
        if recent_pos > recent_neg {
            insights.push("Recently, you've been in a more positive emotional space".into());
        } else if recent_neg > recent_pos {
            insights.push("Lately, you've been working through more complex emotions".into());
        }
    }

    insights.truncate(MAX_INSIGHTS);
    insights
}

/// Dates on which one emotion was recorded; the textual stand-in for a chart.
#[derive(Debug, Clone, Serialize)]
pub struct EmotionSeries {
    pub emotion: Emotion,
    pub color: &'static str,
    pub dates: Vec<String>,
}

/// Group entry dates per emotion, in the fixed [`Emotion::ALL`] order.
pub fn emotion_series(entries: &[TimelineEntry]) -> Vec<EmotionSeries> {
    Emotion::ALL
        .iter()
        .filter_map(|&emotion| {
            let dates: Vec<String> = entries
                .iter()
                .filter(|e| e.emotion == emotion)
                .map(|e| e.date.clone())
                .collect();
            (!dates.is_empty()).then(|| EmotionSeries {
                emotion,
                color: emotion.color(),
                dates,
            })
        })
        .collect()
}
