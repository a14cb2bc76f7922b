//! Capability traits the cascade programs against.
//!
//! The engine never sees a concrete model. Tests substitute deterministic
//! stubs; production wires in the ONNX implementations. Both traits take
//! `&self` — implementations that need mutable inference state (the ONNX
//! session does) hide it behind interior mutability so the cascade stays
//! shareable across threads.

use spendlens_core::ClassifierOutput;

use crate::error::AiError;

/// A trained text classifier over a fixed label set.
///
/// `classify` returns the argmax category and the full probability
/// distribution over [`labels`](TextClassifier::labels); the distribution
/// sums to 1 and `confidence` is its maximum.
pub trait TextClassifier: Send + Sync {
    /// Label set fixed at training time, in model output order.
    fn labels(&self) -> &[String];

    fn classify(&self, clean_text: &str) -> Result<ClassifierOutput, AiError>;

    /// Classify many texts in one model invocation. Output order matches
    /// input order.
    fn classify_batch(&self, clean_texts: &[&str]) -> Result<Vec<ClassifierOutput>, AiError> {
        clean_texts.iter().map(|t| self.classify(t)).collect()
    }
}

/// A sentence embedder producing unit-normalized fixed-length vectors.
pub trait Embedder: Send + Sync {
    /// Embedding dimensionality.
    fn dim(&self) -> usize;

    fn embed(&self, text: &str) -> Result<Vec<f32>, AiError>;

    /// Embed many texts in one model invocation. Output order matches input
    /// order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, AiError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}
