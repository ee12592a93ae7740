//! Text formatting shared by the CLI and MCP tool output.

use std::fmt::Write as _;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::memory::types::Memory;

/// Default format for [`format_timestamp`]: `March 05, 2024 02:30 PM`.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%B %d, %Y %I:%M %p";

/// Reformat an ISO-8601 timestamp with a strftime pattern.
///
/// Returns `timestamp` unchanged when it cannot be parsed or the pattern is invalid.
pub fn format_timestamp(timestamp: &str, format: &str) -> String {
    let formatted = if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp) {
        render(dt.format(format))
    } else if let Ok(naive) = NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f") {
        render(naive.format(format))
    } else if let Ok(date) = NaiveDate::parse_from_str(timestamp, "%Y-%m-%d") {
        render(date.format(format))
    } else {
        None
    };
    formatted.unwrap_or_else(|| timestamp.to_string())
}

fn render(item: impl std::fmt::Display) -> Option<String> {
    let mut out = String::new();
    write!(out, "{item}").ok()?;
    Some(out)
}

/// Keep at most `max_chars` characters, appending `...` when something was cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

/// One-line rendering: `😊 [Mar 05, 2024] content`.
pub fn format_memory_for_display(memory: &Memory, max_length: usize) -> String {
    let content = truncate_chars(&memory.content, max_length);
    let emoji = memory.emotion.emoji();
    if memory.timestamp.is_empty() {
        format!("{emoji} {content}")
    } else {
        let date = format_timestamp(&memory.timestamp, "%b %d, %Y");
        format!("{emoji} [{date}] {content}")
    }
}

/// Greeting for an hour of the day (0-23).
pub fn greeting_for_hour(hour: u32) -> &'static str {
    match hour {
        5..=11 => "Good morning",
        12..=16 => "Good afternoon",
        17..=21 => "Good evening",
        _ => "Good night",
    }
}

/// Greeting for the current local time.
pub fn greeting() -> &'static str {
    use chrono::Timelike;
    greeting_for_hour(chrono::Local::now().hour())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::Emotion;
    use crate::memory::types::{MemoryKind, NewMemory};

    #[test]
    fn formats_rfc3339_with_default_pattern() {
        assert_eq!(
            format_timestamp("2024-03-05T14:30:00+00:00", DEFAULT_TIMESTAMP_FORMAT),
            "March 05, 2024 02:30 PM"
        );
        assert_eq!(
            format_timestamp("2024-03-05T14:30:00Z", "%b %d, %Y"),
            "Mar 05, 2024"
        );
    }

    #[test]
    fn formats_naive_timestamps() {
        assert_eq!(
            format_timestamp("2024-03-05T09:15:42.123456", "%H:%M"),
            "09:15"
        );
        assert_eq!(format_timestamp("2024-03-05", "%d/%m/%Y"), "05/03/2024");
    }

    #[test]
    fn unparsable_input_is_returned_unchanged() {
        assert_eq!(format_timestamp("yesterday", DEFAULT_TIMESTAMP_FORMAT), "yesterday");
        assert_eq!(
            format_timestamp("2024-03-05T14:30:00+00:00", "%Q"),
            "2024-03-05T14:30:00+00:00"
        );
    }

    #[test]
    fn truncation_counts_characters() {
        assert_eq!(truncate_chars("hello", 5), "hello");
        assert_eq!(truncate_chars("hello world", 5), "hello...");
        assert_eq!(truncate_chars("héllo wörld", 7), "héllo w...");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn memory_line_has_emoji_date_and_preview() {
        let memory = Memory::from_new(
            NewMemory::new(MemoryKind::Personal, "We watched the sunrise together")
                .with_emotion(Emotion::Love),
            "m1".into(),
            "u1",
            "2024-06-21T05:10:00+00:00".into(),
        );
        assert_eq!(
            format_memory_for_display(&memory, 10),
            "❤️ [Jun 21, 2024] We watched..."
        );
        // the cut is by characters, so a trailing space is kept
        assert_eq!(
            format_memory_for_display(&memory, 11),
            "❤️ [Jun 21, 2024] We watched ..."
        );
    }

    #[test]
    fn greeting_boundaries() {
        assert_eq!(greeting_for_hour(4), "Good night");
        assert_eq!(greeting_for_hour(5), "Good morning");
        assert_eq!(greeting_for_hour(11), "Good morning");
        assert_eq!(greeting_for_hour(12), "Good afternoon");
        assert_eq!(greeting_for_hour(16), "Good afternoon");
        assert_eq!(greeting_for_hour(17), "Good evening");
        assert_eq!(greeting_for_hour(21), "Good evening");
        assert_eq!(greeting_for_hour(22), "Good night");
    }
}
