//! all-MiniLM-L6-v2 sentence embeddings on ONNX Runtime.

use anyhow::{Context, Result};

use super::{l2_normalize, EmbeddingProvider, EMBEDDING_DIM};
use crate::config::EmbeddingConfig;
use crate::onnx::{ModelFiles, OnnxModel, TokenBatch};

/// all-MiniLM-L6-v2 was trained at 256 tokens.
const MAX_SEQ_LEN: usize = 256;

pub struct LocalEmbeddingProvider {
    model: OnnxModel,
}

impl LocalEmbeddingProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = OnnxModel::load(&ModelFiles {
            dir: crate::config::expand_tilde(&config.cache_dir),
            role: "embedding",
            missing_hint: "Run `echosoul model download` first.",
            max_seq_len: MAX_SEQ_LEN,
            intra_threads: 4,
        })?;
        Ok(Self { model })
    }
}

impl EmbeddingProvider for LocalEmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])?
            .into_iter()
            .next()
            .context("embedding batch returned no vectors")
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let batch = self.model.tokenize(texts)?;

        let mut session = self.model.session()?;
        let outputs = session.run(ort::inputs! {
            "input_ids" => batch.input_ids_tensor()?,
            "attention_mask" => batch.attention_mask_tensor()?,
            "token_type_ids" => batch.token_type_ids_tensor()?,
        })?;

        // output name varies by export
        let hidden = outputs
            .get("token_embeddings")
            .or_else(|| outputs.get("last_hidden_state"))
            .unwrap_or_else(|| &outputs[0]);
        let (shape, data) = hidden
            .try_extract_tensor::<f32>()
            .context("failed to extract token embeddings tensor")?;

        let dims: &[i64] = &shape;
        anyhow::ensure!(
            dims.len() == 3 && dims[2] == EMBEDDING_DIM as i64,
            "unexpected token embeddings shape: {dims:?}, expected [batch, seq, {EMBEDDING_DIM}]"
        );
        Ok(mean_pool(&batch, data, dims[1] as usize))
    }
}

/// Attention-masked mean over the token axis, then L2 normalization.
///
/// `data` is `[batch, out_seq_len, EMBEDDING_DIM]`; the model may emit fewer
/// positions than were fed in.
fn mean_pool(batch: &TokenBatch, data: &[f32], out_seq_len: usize) -> Vec<Vec<f32>> {
    (0..batch.batch_size)
        .map(|b| {
            let mut pooled = vec![0.0f32; EMBEDDING_DIM];
            let mut weight = 0.0f32;
            for s in 0..out_seq_len.min(batch.seq_len) {
                let mask = batch.attention_mask[b * batch.seq_len + s] as f32;
                if mask == 0.0 {
                    continue;
                }
                let row = &data[(b * out_seq_len + s) * EMBEDDING_DIM..][..EMBEDDING_DIM];
                for (slot, x) in pooled.iter_mut().zip(row) {
                    *slot += x * mask;
                }
                weight += mask;
            }
            if weight > 0.0 {
                pooled.iter_mut().for_each(|x| *x /= weight);
            }
            l2_normalize(&pooled)
        })
        .collect()
}
