//! ONNX Runtime implementations of the capability traits.
//!
//! `OnnxTextClassifier` serves a fine-tuned sequence classifier (e.g.
//! DistilBERT) exported to ONNX; `OnnxEmbedder` serves a sentence-transformer
//! (e.g. all-MiniLM-L6-v2) with mean pooling. Model directories hold
//! `model.onnx` and `tokenizer.json`; the classifier additionally needs
//! `labels.json` with its output-order label list.

use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::info;

use spendlens_core::ClassifierOutput;

use crate::capability::{Embedder, TextClassifier};
use crate::centroid::normalize;
use crate::error::AiError;

/// Notification text is short; 256 tokens covers it with room to spare.
const MAX_LENGTH: usize = 256;

/// Fine-tuned sequence classifier served through ONNX Runtime.
pub struct OnnxTextClassifier {
    // Inference needs `&mut Session`; the capability traits are `&self`.
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    labels: Vec<String>,
}

impl OnnxTextClassifier {
    /// Load from a directory containing `model.onnx`, `tokenizer.json`, and
    /// `labels.json`. A missing artifact reports [`AiError::NotReady`].
    pub fn load(model_dir: &Path) -> Result<Self, AiError> {
        let model_path = require(model_dir, "model.onnx")?;
        let labels_path = require(model_dir, "labels.json")?;

        let session = Session::builder()?.commit_from_file(&model_path)?;
        let tokenizer = load_tokenizer(model_dir)?;
        let labels: Vec<String> = serde_json::from_str(&std::fs::read_to_string(&labels_path)?)?;

        info!(
            labels = labels.len(),
            model = %model_path.display(),
            "loaded classifier model"
        );
        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            labels,
        })
    }
}

impl TextClassifier for OnnxTextClassifier {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn classify(&self, clean_text: &str) -> Result<ClassifierOutput, AiError> {
        let mut outputs = self.classify_batch(&[clean_text])?;
        outputs
            .pop()
            .ok_or_else(|| AiError::Inference("empty classifier output".into()))
    }

    fn classify_batch(&self, clean_texts: &[&str]) -> Result<Vec<ClassifierOutput>, AiError> {
        if clean_texts.is_empty() {
            return Ok(vec![]);
        }

        let encoded = encode_batch(&self.tokenizer, clean_texts)?;
        let shape = [encoded.batch as i64, encoded.seq_len as i64];
        let ids_tensor = Tensor::from_array((shape, encoded.input_ids.into_boxed_slice()))?;
        let mask_tensor = Tensor::from_array((shape, encoded.attention_mask.into_boxed_slice()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| AiError::Inference("classifier session lock poisoned".into()))?;
        let outputs = session.run(ort::inputs![
            "input_ids" => ids_tensor,
            "attention_mask" => mask_tensor,
        ])?;

        // Logits: [batch, num_labels].
        let (logits_shape, logits) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = logits_shape;
        let num_labels = self.labels.len();
        if dims.len() != 2 || dims[0] as usize != encoded.batch || dims[1] as usize != num_labels {
            return Err(AiError::Inference(format!(
                "unexpected logits shape {dims:?}, expected [{}, {num_labels}]",
                encoded.batch
            )));
        }

        let mut results = Vec::with_capacity(encoded.batch);
        for row in logits.chunks(num_labels) {
            let probabilities = softmax(row);
            let (best_idx, best_prob) = probabilities
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(i, &p)| (i, p))
                .ok_or_else(|| AiError::Inference("classifier has no labels".into()))?;

            results.push(ClassifierOutput {
                category: self.labels[best_idx].clone(),
                confidence: best_prob,
                probabilities,
            });
        }
        Ok(results)
    }
}

/// Sentence embedder served through ONNX Runtime: mean pooling over token
/// embeddings with the attention mask, L2-normalized.
pub struct OnnxEmbedder {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    dim: usize,
}

impl OnnxEmbedder {
    /// Load from a directory containing `model.onnx` and `tokenizer.json`.
    pub fn load(model_dir: &Path) -> Result<Self, AiError> {
        let model_path = require(model_dir, "model.onnx")?;

        let session = Session::builder()?.commit_from_file(&model_path)?;
        let dim = infer_dim(session.outputs()[0].dtype()).unwrap_or(384);
        let tokenizer = load_tokenizer(model_dir)?;

        info!(dim, model = %model_path.display(), "loaded embedding model");
        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            dim,
        })
    }
}

impl Embedder for OnnxEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, AiError> {
        let mut vectors = self.embed_batch(&[text])?;
        vectors
            .pop()
            .ok_or_else(|| AiError::Inference("empty embedder output".into()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, AiError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let encoded = encode_batch(&self.tokenizer, texts)?;
        let shape = [encoded.batch as i64, encoded.seq_len as i64];
        let attention_mask = encoded.attention_mask.clone();
        let ids_tensor = Tensor::from_array((shape, encoded.input_ids.into_boxed_slice()))?;
        let mask_tensor = Tensor::from_array((shape, encoded.attention_mask.into_boxed_slice()))?;
        let type_tensor = Tensor::from_array((shape, encoded.token_type_ids.into_boxed_slice()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| AiError::Inference("embedder session lock poisoned".into()))?;
        let outputs = session.run(ort::inputs![
            "input_ids" => ids_tensor,
            "attention_mask" => mask_tensor,
            "token_type_ids" => type_tensor,
        ])?;

        // Token embeddings: [batch, seq_len, dim].
        let (output_shape, output_data) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = output_shape;
        if dims.len() != 3 || dims[0] as usize != encoded.batch || dims[2] as usize != self.dim {
            return Err(AiError::Inference(format!(
                "unexpected embedding shape {dims:?}, expected [{}, _, {}]",
                encoded.batch, self.dim
            )));
        }
        let actual_seq_len = dims[1] as usize;

        let mut embeddings = Vec::with_capacity(encoded.batch);
        for i in 0..encoded.batch {
            let mut pooled = vec![0.0f32; self.dim];
            let mut token_count = 0.0f32;

            for j in 0..actual_seq_len {
                let mask_val = attention_mask[i * encoded.seq_len + j] as f32;
                if mask_val > 0.0 {
                    let offset = (i * actual_seq_len + j) * self.dim;
                    for (d, p) in pooled.iter_mut().enumerate() {
                        *p += output_data[offset + d] * mask_val;
                    }
                    token_count += mask_val;
                }
            }

            if token_count > 0.0 {
                for p in &mut pooled {
                    *p /= token_count;
                }
            }
            normalize(&mut pooled);
            embeddings.push(pooled);
        }

        Ok(embeddings)
    }
}

struct EncodedBatch {
    input_ids: Vec<i64>,
    attention_mask: Vec<i64>,
    token_type_ids: Vec<i64>,
    batch: usize,
    seq_len: usize,
}

/// Tokenize a batch into flat `[batch, seq_len]` tensor buffers.
fn encode_batch(tokenizer: &Tokenizer, texts: &[&str]) -> Result<EncodedBatch, AiError> {
    let encodings = tokenizer
        .encode_batch(texts.to_vec(), true)
        .map_err(|e| AiError::Tokenize(e.to_string()))?;

    let batch = texts.len();
    let seq_len = encodings
        .iter()
        .map(|e| e.get_ids().len())
        .max()
        .unwrap_or(0);

    let mut input_ids = vec![0i64; batch * seq_len];
    let mut attention_mask = vec![0i64; batch * seq_len];
    let mut token_type_ids = vec![0i64; batch * seq_len];

    for (i, encoding) in encodings.iter().enumerate() {
        let offset = i * seq_len;
        for (j, &id) in encoding.get_ids().iter().enumerate() {
            input_ids[offset + j] = id as i64;
        }
        for (j, &mask) in encoding.get_attention_mask().iter().enumerate() {
            attention_mask[offset + j] = mask as i64;
        }
        for (j, &tid) in encoding.get_type_ids().iter().enumerate() {
            token_type_ids[offset + j] = tid as i64;
        }
    }

    Ok(EncodedBatch {
        input_ids,
        attention_mask,
        token_type_ids,
        batch,
        seq_len,
    })
}

/// Load `tokenizer.json` with truncation and batch padding configured.
fn load_tokenizer(model_dir: &Path) -> Result<Tokenizer, AiError> {
    let tokenizer_path = require(model_dir, "tokenizer.json")?;

    let mut tokenizer =
        Tokenizer::from_file(&tokenizer_path).map_err(|e| AiError::Tokenize(e.to_string()))?;
    tokenizer
        .with_truncation(Some(tokenizers::TruncationParams {
            max_length: MAX_LENGTH,
            ..Default::default()
        }))
        .map_err(|e| AiError::Tokenize(e.to_string()))?;
    tokenizer.with_padding(Some(tokenizers::PaddingParams {
        ..Default::default()
    }));

    Ok(tokenizer)
}

fn require(model_dir: &Path, file: &str) -> Result<std::path::PathBuf, AiError> {
    let path = model_dir.join(file);
    if !path.exists() {
        return Err(AiError::NotReady(path));
    }
    Ok(path)
}

/// Try to infer the embedding dimension from the ONNX model output type.
fn infer_dim(output_type: &ort::value::ValueType) -> Option<usize> {
    match output_type {
        ort::value::ValueType::Tensor { shape, .. } => {
            // Last dimension is the embedding dim.
            shape
                .last()
                .and_then(|&d| if d > 0 { Some(d as usize) } else { None })
        }
        _ => None,
    }
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum > 0.0 {
        exps.iter().map(|&e| e / sum).collect()
    } else {
        vec![1.0 / logits.len() as f32; logits.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn softmax_handles_large_logits() {
        // Max-subtraction keeps exp() in range.
        let probs = softmax(&[1000.0, 1001.0]);
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert!(probs[1] > probs[0]);
    }

    #[test]
    fn missing_artifacts_report_not_ready() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            OnnxTextClassifier::load(dir.path()),
            Err(AiError::NotReady(_))
        ));
        assert!(matches!(OnnxEmbedder::load(dir.path()), Err(AiError::NotReady(_))));
    }
}
