//! Model capabilities consumed by the cascade: text classification and
//! sentence embedding traits, the per-category centroid index, trained
//! generation persistence, and ONNX-backed implementations (feature `onnx`).

mod capability;
mod centroid;
mod error;
mod generation;
#[cfg(feature = "onnx")]
mod onnx;

pub use capability::{Embedder, TextClassifier};
pub use centroid::CentroidIndex;
pub use error::AiError;
pub use generation::{CentroidEntry, ModelGeneration};
#[cfg(feature = "onnx")]
pub use onnx::{OnnxEmbedder, OnnxTextClassifier};
