use serde::{Deserialize, Serialize};

use super::Emotion;

/// How the companion should pitch a reply to someone feeling a given emotion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseStyle {
    pub tone: String,
    pub response_length: String,
    pub emoji_frequency: String,
    pub empathy_level: String,
}

impl ResponseStyle {
    fn new(tone: &str, response_length: &str, emoji_frequency: &str, empathy_level: &str) -> Self {
        Self {
            tone: tone.into(),
            response_length: response_length.into(),
            emoji_frequency: emoji_frequency.into(),
            empathy_level: empathy_level.into(),
        }
    }
}

/// Only joy, sadness, anxiety, anger and love have their own style; everything
/// else gets the balanced neutral one.
pub fn response_style(emotion: Emotion) -> ResponseStyle {
    match emotion {
        Emotion::Joy => ResponseStyle::new("enthusiastic", "medium", "high", "celebratory"),
        Emotion::Sadness => ResponseStyle::new("gentle", "longer", "low", "high"),
        Emotion::Anxiety => ResponseStyle::new("calm", "medium", "medium", "reassuring"),
        Emotion::Anger => ResponseStyle::new("neutral", "shorter", "none", "understanding"),
        Emotion::Love => ResponseStyle::new("warm", "medium", "high", "reciprocal"),
        _ => ResponseStyle::new("balanced", "medium", "medium", "normal"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sadness_gets_gentle_longer_replies() {
        let style = response_style(Emotion::Sadness);
        assert_eq!(style.tone, "gentle");
        assert_eq!(style.response_length, "longer");
        assert_eq!(style.empathy_level, "high");
    }

    #[test]
    fn anger_gets_no_emoji() {
        assert_eq!(response_style(Emotion::Anger).emoji_frequency, "none");
    }

    #[test]
    fn unlisted_emotions_fall_back_to_neutral() {
        let neutral = response_style(Emotion::Neutral);
        assert_eq!(response_style(Emotion::Nostalgia), neutral);
        assert_eq!(response_style(Emotion::Fear), neutral);
        assert_eq!(neutral.tone, "balanced");
    }
}
