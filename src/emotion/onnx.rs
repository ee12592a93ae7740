//! ONNX Runtime emotion classifier.
//!
//! Expects a sequence-classification export (for example
//! `j-hartmann/emotion-english-distilroberta-base`) in the configured cache
//! directory: `model.onnx`, `tokenizer.json`, and optionally the Hugging Face
//! `config.json` whose `id2label` names the output classes.

use std::path::Path;

use anyhow::{Context, Result};

use super::{EmotionClassifier, LabelScore};
use crate::config::EmotionConfig;
use crate::onnx::{ModelFiles, OnnxModel};

const MAX_SEQ_LEN: usize = 512;

/// Label order of the distilroberta emotion model when no `config.json` is present.
const DEFAULT_LABELS: [&str; 7] = [
    "anger", "disgust", "fear", "joy", "neutral", "sadness", "surprise",
];

pub struct OnnxEmotionClassifier {
    model: OnnxModel,
    labels: Vec<String>,
}

impl OnnxEmotionClassifier {
    pub fn new(config: &EmotionConfig) -> Result<Self> {
        let cache_dir = crate::config::expand_tilde(&config.cache_dir);
        let hint = format!(
            "Export {} to ONNX into that directory, or set emotion.provider = \"lexicon\".",
            config.model
        );
        let model = OnnxModel::load(&ModelFiles {
            dir: cache_dir.clone(),
            role: "emotion",
            missing_hint: &hint,
            max_seq_len: MAX_SEQ_LEN,
            intra_threads: 2,
        })?;
        let labels = read_labels(&cache_dir.join("config.json"))?;
        tracing::debug!(labels = labels.len(), "emotion labels read");

        Ok(Self { model, labels })
    }
}

/// Read `id2label` from a Hugging Face `config.json`, ordered by class id.
fn read_labels(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Ok(DEFAULT_LABELS.iter().map(|l| l.to_string()).collect());
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let json: serde_json::Value = serde_json::from_str(&raw).context("invalid model config.json")?;

    let Some(map) = json.get("id2label").and_then(|v| v.as_object()) else {
        return Ok(DEFAULT_LABELS.iter().map(|l| l.to_string()).collect());
    };

    let mut pairs = Vec::with_capacity(map.len());
    for (id, label) in map {
        let id: usize = id
            .parse()
            .with_context(|| format!("non-numeric id2label key: {id}"))?;
        let label = label.as_str().context("id2label value is not a string")?;
        pairs.push((id, label.to_string()));
    }
    pairs.sort_by_key(|(id, _)| *id);
    Ok(pairs.into_iter().map(|(_, l)| l).collect())
}

pub(crate) fn softmax(logits: &[f32]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f64> = logits.iter().map(|&x| ((x - max) as f64).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

impl EmotionClassifier for OnnxEmotionClassifier {
    fn classify(&self, text: &str) -> Result<Vec<LabelScore>> {
        let batch = self.model.tokenize(&[text])?;

        let mut session = self.model.session()?;
        let outputs = session.run(ort::inputs! {
            "input_ids" => batch.input_ids_tensor()?,
            "attention_mask" => batch.attention_mask_tensor()?,
        })?;

        let logits_value = outputs.get("logits").unwrap_or_else(|| &outputs[0]);
        let (_, logits) = logits_value
            .try_extract_tensor::<f32>()
            .context("failed to extract logits tensor")?;

        anyhow::ensure!(
            logits.len() == self.labels.len(),
            "model produced {} logits for {} labels",
            logits.len(),
            self.labels.len()
        );

        Ok(self
            .labels
            .iter()
            .zip(softmax(logits))
            .map(|(label, score)| LabelScore::new(label.clone(), score))
            .collect())
    }
}
