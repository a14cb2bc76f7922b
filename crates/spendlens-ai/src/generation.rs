//! Trained-generation persistence.
//!
//! A generation bundles everything produced by one training pass that the
//! cascade must reload together: the label set, the decision thresholds, and
//! the centroid table. It is one JSON document written atomically (temp file
//! plus rename), so a reload never observes labels from one run mixed with
//! centroids from another.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spendlens_core::CascadeConfig;

use crate::centroid::CentroidIndex;
use crate::error::AiError;

/// One persisted centroid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CentroidEntry {
    pub label: String,
    pub vector: Vec<f32>,
}

/// Atomic unit persisted per training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelGeneration {
    /// Classifier label set in model output order.
    pub labels: Vec<String>,
    /// Thresholds in force when this generation was trained.
    pub config: CascadeConfig,
    /// Embedding dimensionality of the centroid table.
    pub embed_dim: usize,
    /// Unit-normalized per-category centroids, first-seen order.
    pub centroids: Vec<CentroidEntry>,
    pub trained_at: DateTime<Utc>,
}

impl ModelGeneration {
    /// Bundle a freshly built index with its labels and thresholds.
    pub fn new(labels: Vec<String>, config: CascadeConfig, index: &CentroidIndex) -> Self {
        let centroids = index
            .entries()
            .iter()
            .map(|(label, vector)| CentroidEntry {
                label: label.clone(),
                vector: vector.clone(),
            })
            .collect();
        Self {
            labels,
            config,
            embed_dim: index.dim(),
            centroids,
            trained_at: Utc::now(),
        }
    }

    /// Write the generation as one JSON document.
    ///
    /// Writes to a temp file in the destination directory, then renames over
    /// the target, so concurrent readers see fully-old or fully-new.
    pub fn save(&self, path: &Path) -> Result<(), AiError> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;

        let json = serde_json::to_vec_pretty(self)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.persist(path).map_err(|e| AiError::Io(e.error))?;

        tracing::info!(
            path = %path.display(),
            labels = self.labels.len(),
            centroids = self.centroids.len(),
            "generation saved"
        );
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, AiError> {
        if !path.exists() {
            return Err(AiError::NotReady(path.to_path_buf()));
        }
        let json = std::fs::read_to_string(path)?;
        let generation: Self = serde_json::from_str(&json)?;
        tracing::info!(
            path = %path.display(),
            labels = generation.labels.len(),
            centroids = generation.centroids.len(),
            "generation loaded"
        );
        Ok(generation)
    }

    /// Rebuild the centroid index for this generation, validating dimensions.
    pub fn centroid_index(&self) -> Result<CentroidIndex, AiError> {
        let entries = self
            .centroids
            .iter()
            .map(|e| (e.label.clone(), e.vector.clone()))
            .collect();
        CentroidIndex::from_entries(entries, self.embed_dim)
    }
}
