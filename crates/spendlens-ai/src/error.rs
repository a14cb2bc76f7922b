use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    /// Model artifacts missing — the classifier has not been trained or
    /// exported yet. Distinct from a default distribution: callers must see
    /// an explicit not-ready condition.
    #[error("model not ready: {0} not found")]
    NotReady(PathBuf),

    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("training inputs misaligned: {texts} texts vs {labels} labels")]
    LengthMismatch { texts: usize, labels: usize },

    #[error("tokenize: {0}")]
    Tokenize(String),

    #[error("inference: {0}")]
    Inference(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed generation file: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "onnx")]
    #[error("onnx runtime error: {0}")]
    Onnx(#[from] ort::Error),
}
