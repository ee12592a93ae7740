//! Folding classifier labels into [`Emotion`]s, and reading mood across a conversation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Emotion, EmotionAnalysis, EmotionClassifier};

/// Emotions counted as positive when reading a conversation's mood.
const POSITIVE: [Emotion; 5] = [
    Emotion::Joy,
    Emotion::Excitement,
    Emotion::Love,
    Emotion::Contentment,
    Emotion::Surprise,
];

/// Emotions counted as negative when reading a conversation's mood.
const NEGATIVE: [Emotion; 6] = [
    Emotion::Sadness,
    Emotion::Anger,
    Emotion::Fear,
    Emotion::Anxiety,
    Emotion::Stress,
    Emotion::Disgust,
];

/// Window of most recent emotions used for the mood trend.
const TREND_WINDOW: usize = 5;
/// Number of most recent emotions echoed back in a [`ConversationPattern`].
const HISTORY_WINDOW: usize = 10;

pub struct EmotionAnalyzer {
    classifier: Box<dyn EmotionClassifier>,
}

impl EmotionAnalyzer {
    pub fn new(classifier: Box<dyn EmotionClassifier>) -> Self {
        Self { classifier }
    }

    /// Detect the emotions expressed in `text`.
    ///
    /// Blank text, classifier failures, and texts whose labels all fall outside
    /// the companion's vocabulary yield [`EmotionAnalysis::neutral`].
    pub fn analyze_text(&self, text: &str) -> EmotionAnalysis {
        if text.trim().is_empty() {
            return EmotionAnalysis::neutral();
        }

        let labels = match self.classifier.classify(text) {
            Ok(labels) => labels,
            Err(e) => {
                tracing::warn!(error = %e, "emotion analysis failed");
                return EmotionAnalysis::neutral();
            }
        };

        // Insertion order decides ties for the dominant emotion.
        let mut scores: Vec<(Emotion, f64)> = Vec::new();
        for entry in labels {
            let label = entry.label.to_lowercase();
            match map_label(&label) {
                Some((emotion, Fold::Add)) => add_score(&mut scores, emotion, entry.score),
                Some((emotion, Fold::Set)) => set_score(&mut scores, emotion, entry.score),
                None => {}
            }
        }

        let total: f64 = scores.iter().map(|(_, s)| s).sum();
        if total > 0.0 {
            for (_, score) in scores.iter_mut() {
                *score /= total;
            }
        }

        let mut dominant: Option<(Emotion, f64)> = None;
        for &(emotion, score) in &scores {
            if dominant.map_or(true, |(_, best)| score > best) {
                dominant = Some((emotion, score));
            }
        }

        match dominant {
            Some((emotion, confidence)) => EmotionAnalysis {
                dominant_emotion: emotion,
                confidence,
                all_emotions: scores
                    .iter()
                    .map(|(e, s)| (e.as_str().to_string(), *s))
                    .collect::<BTreeMap<_, _>>(),
                timestamp: Some(chrono::Utc::now().to_rfc3339()),
            },
            None => EmotionAnalysis::neutral(),
        }
    }
}

enum Fold {
    Add,
    Set,
}

fn map_label(label: &str) -> Option<(Emotion, Fold)> {
    match label {
        "joy" | "happy" => Some((Emotion::Joy, Fold::Add)),
        "sadness" | "sad" => Some((Emotion::Sadness, Fold::Add)),
        "anger" => Some((Emotion::Anger, Fold::Set)),
        "fear" => Some((Emotion::Fear, Fold::Set)),
        "surprise" => Some((Emotion::Surprise, Fold::Set)),
        "disgust" => Some((Emotion::Disgust, Fold::Set)),
        l if l.contains("anxiety") || l.contains("nervous") => Some((Emotion::Anxiety, Fold::Add)),
        l if l.contains("love") || l.contains("affection") => Some((Emotion::Love, Fold::Add)),
        _ => None,
    }
}

fn add_score(scores: &mut Vec<(Emotion, f64)>, emotion: Emotion, score: f64) {
    match scores.iter_mut().find(|(e, _)| *e == emotion) {
        Some((_, s)) => *s += score,
        None => scores.push((emotion, score)),
    }
}

fn set_score(scores: &mut Vec<(Emotion, f64)>, emotion: Emotion, score: f64) {
    match scores.iter_mut().find(|(e, _)| *e == emotion) {
        Some((_, s)) => *s = score,
        None => scores.push((emotion, score)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoodTrend {
    Positive,
    Negative,
    Stable,
}

impl std::fmt::Display for MoodTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Stable => "stable",
        })
    }
}

/// Emotional shape of a run of messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationPattern {
    pub mood_trend: MoodTrend,
    /// Distinct emotions seen, as a fraction of all known emotions.
    pub emotional_variety: f64,
    pub dominant_pattern: Emotion,
    pub emotion_history: Vec<Emotion>,
}

/// Summarize the emotions of a conversation, oldest first.
pub fn conversation_pattern(emotions: &[Emotion]) -> ConversationPattern {
    if emotions.is_empty() {
        return ConversationPattern {
            mood_trend: MoodTrend::Stable,
            emotional_variety: 0.0,
            dominant_pattern: Emotion::Neutral,
            emotion_history: Vec::new(),
        };
    }

    let mut counts: Vec<(Emotion, usize)> = Vec::new();
    for &emotion in emotions {
        match counts.iter_mut().find(|(e, _)| *e == emotion) {
            Some((_, n)) => *n += 1,
            None => counts.push((emotion, 1)),
        }
    }

    let emotional_variety = counts.len() as f64 / Emotion::ALL.len() as f64;

    let recent = &emotions[emotions.len().saturating_sub(TREND_WINDOW)..];
    let positive = recent.iter().filter(|e| POSITIVE.contains(e)).count();
    let negative = recent.iter().filter(|e| NEGATIVE.contains(e)).count();
    let mood_trend = match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => MoodTrend::Positive,
        std::cmp::Ordering::Less => MoodTrend::Negative,
        std::cmp::Ordering::Equal => MoodTrend::Stable,
    };

    let mut dominant_pattern = counts[0];
    for &entry in &counts[1..] {
        if entry.1 > dominant_pattern.1 {
            dominant_pattern = entry;
        }
    }

    ConversationPattern {
        mood_trend,
        emotional_variety,
        dominant_pattern: dominant_pattern.0,
        emotion_history: emotions[emotions.len().saturating_sub(HISTORY_WINDOW)..].to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::lexicon::LexiconClassifier;
    use crate::emotion::LabelScore;

    struct FixedClassifier(Vec<LabelScore>);

    impl EmotionClassifier for FixedClassifier {
        fn classify(&self, _text: &str) -> anyhow::Result<Vec<LabelScore>> {
            Ok(self.0.clone())
        }
    }

    struct FailingClassifier;

    impl EmotionClassifier for FailingClassifier {
        fn classify(&self, _text: &str) -> anyhow::Result<Vec<LabelScore>> {
            anyhow::bail!("model exploded")
        }
    }

    fn lexicon() -> EmotionAnalyzer {
        EmotionAnalyzer::new(Box::new(LexiconClassifier::new()))
    }

    #[test]
    fn blank_text_is_neutral_without_timestamp() {
        let analysis = lexicon().analyze_text("   \n");
        assert_eq!(analysis, EmotionAnalysis::neutral());
    }

    #[test]
    fn happy_text_is_joy() {
        let analysis = lexicon().analyze_text("I am so happy today!");
        assert_eq!(analysis.dominant_emotion, Emotion::Joy);
        assert!((analysis.confidence - 1.0).abs() < 1e-9);
        assert!(analysis.timestamp.is_some());
    }

    #[test]
    fn mixed_text_splits_confidence_and_first_label_wins_ties() {
        let analysis = lexicon().analyze_text("I was happy but then felt sad");
        assert_eq!(analysis.dominant_emotion, Emotion::Joy);
        assert!((analysis.all_emotions["joy"] - 0.5).abs() < 1e-9);
        assert!((analysis.all_emotions["sadness"] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn labels_are_folded_into_companion_emotions() {
        let analyzer = EmotionAnalyzer::new(Box::new(FixedClassifier(vec![
            LabelScore::new("Joy", 0.2),
            LabelScore::new("happy", 0.2),
            LabelScore::new("anger", 0.1),
            LabelScore::new("anger", 0.3),
            LabelScore::new("nervousness", 0.1),
            LabelScore::new("neutral", 0.9),
        ])));

        let analysis = analyzer.analyze_text("anything");
        assert_eq!(analysis.dominant_emotion, Emotion::Joy);
        // joy 0.4, anger 0.3 (assigned, not summed), anxiety 0.1; neutral is dropped
        assert!((analysis.all_emotions["joy"] - 0.5).abs() < 1e-9);
        assert!((analysis.all_emotions["anger"] - 0.375).abs() < 1e-9);
        assert!((analysis.all_emotions["anxiety"] - 0.125).abs() < 1e-9);
        assert!(!analysis.all_emotions.contains_key("neutral"));
    }

    #[test]
    fn only_unmapped_labels_is_neutral() {
        let analyzer = EmotionAnalyzer::new(Box::new(FixedClassifier(vec![LabelScore::new(
            "neutral", 1.0,
        )])));
        assert_eq!(analyzer.analyze_text("The bus comes at noon."), EmotionAnalysis::neutral());
    }

    #[test]
    fn classifier_error_is_neutral() {
        let analyzer = EmotionAnalyzer::new(Box::new(FailingClassifier));
        assert_eq!(analyzer.analyze_text("hello"), EmotionAnalysis::neutral());
    }

    #[test]
    fn empty_conversation_is_stable() {
        let pattern = conversation_pattern(&[]);
        assert_eq!(pattern.mood_trend, MoodTrend::Stable);
        assert_eq!(pattern.emotional_variety, 0.0);
        assert_eq!(pattern.dominant_pattern, Emotion::Neutral);
    }

    #[test]
    fn trend_uses_last_five_messages() {
        let emotions = [
            Emotion::Joy,
            Emotion::Joy,
            Emotion::Joy,
            Emotion::Sadness,
            Emotion::Anger,
            Emotion::Fear,
            Emotion::Neutral,
            Emotion::Love,
        ];
        let pattern = conversation_pattern(&emotions);
        // last five: sadness, anger, fear, neutral, love -> 3 negative vs 1 positive
        assert_eq!(pattern.mood_trend, MoodTrend::Negative);
        assert_eq!(pattern.dominant_pattern, Emotion::Joy);
        assert!((pattern.emotional_variety - 6.0 / 13.0).abs() < 1e-9);
    }

    #[test]
    fn dominant_pattern_prefers_first_seen_on_ties() {
        let pattern = conversation_pattern(&[Emotion::Sadness, Emotion::Joy, Emotion::Joy, Emotion::Sadness]);
        assert_eq!(pattern.dominant_pattern, Emotion::Sadness);
        assert_eq!(pattern.mood_trend, MoodTrend::Stable);
    }

    #[test]
    fn history_keeps_last_ten() {
        let emotions: Vec<Emotion> = (0..12)
            .map(|i| if i < 2 { Emotion::Anger } else { Emotion::Contentment })
            .collect();
        let pattern = conversation_pattern(&emotions);
        assert_eq!(pattern.emotion_history.len(), 10);
        assert!(pattern.emotion_history.iter().all(|e| *e == Emotion::Contentment));
        assert_eq!(pattern.mood_trend, MoodTrend::Positive);
    }
}
