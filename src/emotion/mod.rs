//! Emotion recognition.
//!
//! A [`classifier::EmotionClassifier`] produces raw `(label, score)` pairs; the
//! [`analyzer::EmotionAnalyzer`] folds those labels into the companion's
//! [`Emotion`] vocabulary, normalizes them, and picks a dominant emotion.
//! [`style::response_style`] turns that emotion into guidance for the reply.

pub mod analyzer;
pub mod classifier;
pub mod lexicon;
pub mod onnx;
pub mod style;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use analyzer::{conversation_pattern, ConversationPattern, EmotionAnalyzer, MoodTrend};
pub use classifier::{EmotionClassifier, LabelScore};
pub use style::{response_style, ResponseStyle};

/// Every emotion the companion can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    Joy,
    Sadness,
    Anger,
    Fear,
    Surprise,
    Disgust,
    Neutral,
    Excitement,
    Anxiety,
    Stress,
    Contentment,
    Love,
    Nostalgia,
}

impl Emotion {
    pub const ALL: [Emotion; 13] = [
        Self::Joy,
        Self::Sadness,
        Self::Anger,
        Self::Fear,
        Self::Surprise,
        Self::Disgust,
        Self::Neutral,
        Self::Excitement,
        Self::Anxiety,
        Self::Stress,
        Self::Contentment,
        Self::Love,
        Self::Nostalgia,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Joy => "joy",
            Self::Sadness => "sadness",
            Self::Anger => "anger",
            Self::Fear => "fear",
            Self::Surprise => "surprise",
            Self::Disgust => "disgust",
            Self::Neutral => "neutral",
            Self::Excitement => "excitement",
            Self::Anxiety => "anxiety",
            Self::Stress => "stress",
            Self::Contentment => "contentment",
            Self::Love => "love",
            Self::Nostalgia => "nostalgia",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Joy => "😊",
            Self::Sadness => "😢",
            Self::Anger => "😠",
            Self::Fear => "😨",
            Self::Surprise => "😲",
            Self::Love => "❤️",
            Self::Anxiety => "😰",
            Self::Stress => "😫",
            Self::Excitement => "🎉",
            Self::Contentment => "😌",
            Self::Neutral => "😐",
            Self::Disgust => "🤢",
            Self::Nostalgia => "💭",
        }
    }

    /// CSS hex colour used when rendering this emotion.
    pub fn color(&self) -> &'static str {
        match self {
            Self::Joy => "#FFD700",
            Self::Sadness => "#4169E1",
            Self::Anger => "#FF4500",
            Self::Fear => "#8A2BE2",
            Self::Surprise => "#00CED1",
            Self::Love => "#FF69B4",
            Self::Anxiety => "#8B4513",
            Self::Stress => "#A0522D",
            Self::Excitement => "#32CD32",
            Self::Contentment => "#90EE90",
            Self::Disgust => "#556B2F",
            Self::Neutral | Self::Nostalgia => "#808080",
        }
    }

    /// Weight of this emotion on a -1.0 (negative) to 1.0 (positive) axis.
    pub fn sentiment_weight(&self) -> f64 {
        match self {
            Self::Joy | Self::Love => 1.0,
            Self::Excitement => 0.9,
            Self::Contentment => 0.8,
            Self::Surprise => 0.3,
            Self::Neutral => 0.5,
            Self::Sadness => -0.8,
            Self::Anger | Self::Disgust => -0.9,
            Self::Fear => -0.7,
            Self::Anxiety => -0.6,
            Self::Stress => -0.5,
            Self::Nostalgia => 0.0,
        }
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Emotion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| format!("unknown emotion: {s}"))
    }
}

/// Result of analyzing one piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionAnalysis {
    pub dominant_emotion: Emotion,
    pub confidence: f64,
    /// Normalized scores keyed by emotion name; sums to 1.0 when non-empty.
    pub all_emotions: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl EmotionAnalysis {
    /// The analysis reported for blank input or when classification fails.
    pub fn neutral() -> Self {
        Self {
            dominant_emotion: Emotion::Neutral,
            confidence: 1.0,
            all_emotions: BTreeMap::new(),
            timestamp: None,
        }
    }
}

/// Sentiment of an analysis scaled to `[0.0, 1.0]`; 0.5 is neutral.
pub fn sentiment_score(analysis: &EmotionAnalysis) -> f64 {
    let mut total_score = 0.0;
    let mut total_weight = 0.0;

    for (name, confidence) in &analysis.all_emotions {
        let weight = name
            .parse::<Emotion>()
            .map(|e| e.sentiment_weight())
            .unwrap_or(0.0);
        total_score += weight * confidence;
        total_weight += weight.abs() * confidence;
    }

    if total_weight > 0.0 {
        (total_score / total_weight + 1.0) / 2.0
    } else {
        0.5
    }
}

/// Create the configured emotion classifier.
pub fn create_classifier(
    config: &crate::config::EmotionConfig,
) -> Result<Box<dyn EmotionClassifier>> {
    match config.provider.as_str() {
        "lexicon" => Ok(Box::new(lexicon::LexiconClassifier::new())),
        "onnx" => Ok(Box::new(onnx::OnnxEmotionClassifier::new(config)?)),
        other => anyhow::bail!("unknown emotion provider: {other}. Supported: lexicon, onnx"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emotion_names_round_trip_through_from_str() {
        for emotion in Emotion::ALL {
            assert_eq!(emotion.as_str().parse::<Emotion>().unwrap(), emotion);
        }
        assert!("melancholy".parse::<Emotion>().is_err());
    }

    #[test]
    fn emotion_serializes_snake_case() {
        let json = serde_json::to_string(&Emotion::Contentment).unwrap();
        assert_eq!(json, "\"contentment\"");
    }

    #[test]
    fn sentiment_defaults_to_neutral_without_scores() {
        assert_eq!(sentiment_score(&EmotionAnalysis::neutral()), 0.5);
    }

    #[test]
    fn sentiment_of_pure_joy_is_one() {
        let mut analysis = EmotionAnalysis::neutral();
        analysis.all_emotions.insert("joy".into(), 1.0);
        assert!((sentiment_score(&analysis) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn sentiment_of_mixed_scores_is_weighted() {
        let mut analysis = EmotionAnalysis::neutral();
        analysis.all_emotions.insert("joy".into(), 0.5);
        analysis.all_emotions.insert("sadness".into(), 0.5);
        // (0.5 - 0.4) / (0.5 + 0.4) = 0.111..., scaled to 0.5555...
        let score = sentiment_score(&analysis);
        assert!((score - (0.1 / 0.9 + 1.0) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let config = crate::config::EmotionConfig {
            provider: "cloud".into(),
            ..Default::default()
        };
        assert!(create_classifier(&config).is_err());
    }
}
