//! ONNX Runtime plumbing shared by the embedding and emotion models.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;

/// Where a model lives and how to load it.
pub struct ModelFiles<'a> {
    pub dir: PathBuf,
    /// Used in log lines and errors, e.g. `"embedding"`.
    pub role: &'a str,
    /// Appended to the "not found" error.
    pub missing_hint: &'a str,
    pub max_seq_len: usize,
    pub intra_threads: usize,
}

/// A tokenizer plus a session. The session needs `&mut` to run, so it sits
/// behind a mutex.
pub struct OnnxModel {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
}

// Safety: Tokenizer is Send+Sync and the Session is only touched behind the Mutex.
unsafe impl Send for OnnxModel {}
unsafe impl Sync for OnnxModel {}

impl OnnxModel {
    /// Load `model.onnx` and `tokenizer.json` from `files.dir`, truncating and
    /// padding every batch to its longest member.
    pub fn load(files: &ModelFiles<'_>) -> Result<Self> {
        let model_path = files.dir.join("model.onnx");
        let tokenizer_path = files.dir.join("tokenizer.json");

        anyhow::ensure!(
            model_path.exists(),
            "{} model not found at {}. {}",
            files.role,
            model_path.display(),
            files.missing_hint
        );
        anyhow::ensure!(
            tokenizer_path.exists(),
            "{} tokenizer not found at {}. {}",
            files.role,
            tokenizer_path.display(),
            files.missing_hint
        );

        let session = Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .with_intra_threads(files.intra_threads)?
            .commit_from_file(&model_path)
            .with_context(|| format!("failed to load ONNX {} model", files.role))?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("failed to load {} tokenizer: {e}", files.role))?;
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: files.max_seq_len,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("failed to set truncation: {e}"))?;
        tokenizer.with_padding(Some(tokenizers::PaddingParams {
            strategy: tokenizers::PaddingStrategy::BatchLongest,
            ..Default::default()
        }));

        tracing::info!(role = files.role, model = %model_path.display(), "onnx model loaded");
        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
        })
    }

    pub fn tokenize(&self, texts: &[&str]) -> Result<TokenBatch> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("tokenization failed: {e}"))?;

        let seq_len = encodings.first().map_or(0, |e| e.get_ids().len());
        let mut batch = TokenBatch {
            batch_size: encodings.len(),
            seq_len,
            input_ids: Vec::with_capacity(encodings.len() * seq_len),
            attention_mask: Vec::with_capacity(encodings.len() * seq_len),
        };
        for encoding in &encodings {
            batch
                .input_ids
                .extend(encoding.get_ids().iter().map(|&id| i64::from(id)));
            batch
                .attention_mask
                .extend(encoding.get_attention_mask().iter().map(|&m| i64::from(m)));
        }
        Ok(batch)
    }

    pub fn session(&self) -> Result<MutexGuard<'_, Session>> {
        self.session
            .lock()
            .map_err(|e| anyhow::anyhow!("session lock poisoned: {e}"))
    }
}

/// Row-major `[batch, seq]` token ids and attention mask.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenBatch {
    pub batch_size: usize,
    pub seq_len: usize,
    pub input_ids: Vec<i64>,
    pub attention_mask: Vec<i64>,
}

impl TokenBatch {
    fn shape(&self) -> Vec<i64> {
        vec![self.batch_size as i64, self.seq_len as i64]
    }

    pub fn input_ids_tensor(&self) -> Result<Tensor<i64>> {
        Ok(Tensor::from_array((
            self.shape(),
            self.input_ids.clone().into_boxed_slice(),
        ))?)
    }

    pub fn attention_mask_tensor(&self) -> Result<Tensor<i64>> {
        Ok(Tensor::from_array((
            self.shape(),
            self.attention_mask.clone().into_boxed_slice(),
        ))?)
    }

    /// All zeros: every input is a single segment.
    pub fn token_type_ids_tensor(&self) -> Result<Tensor<i64>> {
        Ok(Tensor::from_array((
            self.shape(),
            vec![0i64; self.batch_size * self.seq_len].into_boxed_slice(),
        ))?)
    }
}
