//! Hybrid classification engine: a three-tier cascade of deterministic rules,
//! a learned classifier, and a nearest-centroid semantic fallback, with an
//! explicit confidence-blending policy for disagreement between tiers.

mod batch;
mod cascade;
mod error;
#[cfg(test)]
pub(crate) mod testutil;

pub use cascade::CascadeClassifier;
pub use error::EngineError;
