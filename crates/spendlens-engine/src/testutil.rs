//! Deterministic stub capabilities for cascade tests.
//!
//! The stubs answer from fixed tables and count invocations, so tests can
//! assert both outcomes and which tiers actually ran.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use spendlens_ai::{AiError, Embedder, TextClassifier};
use spendlens_core::ClassifierOutput;

pub(crate) struct StubClassifier {
    labels: Vec<String>,
    responses: HashMap<String, (String, f32)>,
    pub calls: AtomicUsize,
    pub batch_calls: AtomicUsize,
}

impl StubClassifier {
    pub fn new<const N: usize>(labels: [&str; N]) -> Self {
        Self {
            labels: labels.iter().map(|s| s.to_string()).collect(),
            responses: HashMap::new(),
            calls: AtomicUsize::new(0),
            batch_calls: AtomicUsize::new(0),
        }
    }

    /// Fixed answer for an exact clean text. Unknown texts get a uniform
    /// distribution.
    pub fn respond(mut self, clean_text: &str, category: &str, confidence: f32) -> Self {
        self.responses
            .insert(clean_text.to_string(), (category.to_string(), confidence));
        self
    }

    fn output_for(&self, text: &str) -> ClassifierOutput {
        let n = self.labels.len();
        match self.responses.get(text) {
            Some((category, confidence)) => {
                let idx = self
                    .labels
                    .iter()
                    .position(|l| l == category)
                    .expect("stub response category not in label set");
                let rest = if n > 1 { (1.0 - confidence) / (n - 1) as f32 } else { 0.0 };
                let mut probabilities = vec![rest; n];
                probabilities[idx] = *confidence;
                ClassifierOutput {
                    category: category.clone(),
                    confidence: *confidence,
                    probabilities,
                }
            }
            None => ClassifierOutput {
                category: self.labels[0].clone(),
                confidence: 1.0 / n as f32,
                probabilities: vec![1.0 / n as f32; n],
            },
        }
    }
}

impl TextClassifier for StubClassifier {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn classify(&self, clean_text: &str) -> Result<ClassifierOutput, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.output_for(clean_text))
    }

    fn classify_batch(&self, clean_texts: &[&str]) -> Result<Vec<ClassifierOutput>, AiError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(clean_texts.iter().map(|t| self.output_for(t)).collect())
    }
}

/// Classifier whose every call fails, for tier-boundary degradation tests.
pub(crate) struct FailingClassifier {
    labels: Vec<String>,
}

impl FailingClassifier {
    pub fn new() -> Self {
        Self {
            labels: vec!["Fuel".to_string(), "Food".to_string()],
        }
    }
}

impl TextClassifier for FailingClassifier {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn classify(&self, _clean_text: &str) -> Result<ClassifierOutput, AiError> {
        Err(AiError::Inference("stub classifier failure".into()))
    }

    fn classify_batch(&self, _clean_texts: &[&str]) -> Result<Vec<ClassifierOutput>, AiError> {
        Err(AiError::Inference("stub classifier failure".into()))
    }
}

pub(crate) struct StubEmbedder {
    dim: usize,
    vectors: HashMap<String, Vec<f32>>,
    pub calls: AtomicUsize,
    pub batch_calls: AtomicUsize,
}

impl StubEmbedder {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            vectors: HashMap::new(),
            calls: AtomicUsize::new(0),
            batch_calls: AtomicUsize::new(0),
        }
    }

    /// Fixed vector for an exact text. Unknown texts embed to zero, which
    /// scores 0 against every centroid.
    pub fn vector(mut self, text: &str, v: Vec<f32>) -> Self {
        assert_eq!(v.len(), self.dim);
        self.vectors.insert(text.to_string(), v);
        self
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        self.vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| vec![0.0; self.dim])
    }
}

impl Embedder for StubEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.vector_for(text))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, AiError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }
}

/// Embedder whose every call fails.
pub(crate) struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn dim(&self) -> usize {
        4
    }

    fn embed(&self, _text: &str) -> Result<Vec<f32>, AiError> {
        Err(AiError::Inference("stub embedder failure".into()))
    }

    fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>, AiError> {
        Err(AiError::Inference("stub embedder failure".into()))
    }
}
