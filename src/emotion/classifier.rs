use anyhow::Result;

/// One raw label from a classifier. Labels are free-form; the analyzer maps them.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

impl LabelScore {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Scores every label a model knows for a piece of text.
///
/// Synchronous and possibly CPU-heavy; async callers should use
/// `tokio::task::spawn_blocking`.
pub trait EmotionClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Result<Vec<LabelScore>>;
}
