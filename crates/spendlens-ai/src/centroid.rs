//! Per-category centroid index for the semantic fallback tier.
//!
//! One unit-normalized mean embedding per category with at least one training
//! example. Query cost is one dot product per category; no training beyond
//! aggregation, which keeps this signal decorrelated from the supervised
//! classifier's decision boundary.

use spendlens_core::EmbedMatch;

use crate::capability::Embedder;
use crate::error::AiError;

/// Immutable centroid table. Entries keep first-seen label order so queries
/// are deterministic; lifetime is tied to one trained generation.
#[derive(Debug)]
pub struct CentroidIndex {
    entries: Vec<(String, Vec<f32>)>,
    dim: usize,
}

impl CentroidIndex {
    /// Build centroids from labelled training texts.
    ///
    /// Embeds all texts in one batched call, accumulates a mean vector per
    /// distinct label, and re-normalizes each mean to unit length.
    pub fn build(
        embedder: &dyn Embedder,
        texts: &[&str],
        labels: &[&str],
    ) -> Result<Self, AiError> {
        if texts.len() != labels.len() {
            return Err(AiError::LengthMismatch {
                texts: texts.len(),
                labels: labels.len(),
            });
        }

        let dim = embedder.dim();
        let vectors = embedder.embed_batch(texts)?;

        // label → (sum, count), first-seen label order.
        let mut accum: Vec<(String, Vec<f32>, usize)> = Vec::new();
        for (label, vector) in labels.iter().zip(&vectors) {
            if vector.len() != dim {
                return Err(AiError::DimensionMismatch {
                    expected: dim,
                    got: vector.len(),
                });
            }
            let idx = match accum.iter().position(|(l, _, _)| l == label) {
                Some(idx) => idx,
                None => {
                    accum.push((label.to_string(), vec![0.0f32; dim], 0));
                    accum.len() - 1
                }
            };
            let entry = &mut accum[idx];
            for (acc, &val) in entry.1.iter_mut().zip(vector) {
                *acc += val;
            }
            entry.2 += 1;
        }

        let mut entries = Vec::with_capacity(accum.len());
        for (label, mut sum, count) in accum {
            if count > 0 {
                for v in &mut sum {
                    *v /= count as f32;
                }
                normalize(&mut sum);
                entries.push((label, sum));
            }
        }

        tracing::info!(centroids = entries.len(), dim, "centroid index built");
        Ok(Self { entries, dim })
    }

    /// Rehydrate an index from persisted entries (see `ModelGeneration`).
    pub fn from_entries(entries: Vec<(String, Vec<f32>)>, dim: usize) -> Result<Self, AiError> {
        for (_, vector) in &entries {
            if vector.len() != dim {
                return Err(AiError::DimensionMismatch {
                    expected: dim,
                    got: vector.len(),
                });
            }
        }
        Ok(Self { entries, dim })
    }

    /// Best-matching category for a query text, or `None` with no centroids.
    pub fn match_best(
        &self,
        embedder: &dyn Embedder,
        clean_text: &str,
    ) -> Result<Option<EmbedMatch>, AiError> {
        if self.entries.is_empty() {
            return Ok(None);
        }
        let query = embedder.embed(clean_text)?;
        self.best_for_vector(&query)
    }

    /// Batched variant of [`match_best`](Self::match_best): one embedding
    /// call for all texts.
    pub fn match_batch(
        &self,
        embedder: &dyn Embedder,
        clean_texts: &[&str],
    ) -> Result<Vec<Option<EmbedMatch>>, AiError> {
        if self.entries.is_empty() {
            return Ok(vec![None; clean_texts.len()]);
        }
        let queries = embedder.embed_batch(clean_texts)?;
        queries.iter().map(|q| self.best_for_vector(q)).collect()
    }

    fn best_for_vector(&self, query: &[f32]) -> Result<Option<EmbedMatch>, AiError> {
        if query.len() != self.dim {
            return Err(AiError::DimensionMismatch {
                expected: self.dim,
                got: query.len(),
            });
        }

        let mut best: Option<EmbedMatch> = None;
        for (label, centroid) in &self.entries {
            let similarity = cosine_sim(query, centroid);
            if best.as_ref().is_none_or(|b| similarity > b.similarity) {
                best = Some(EmbedMatch {
                    category: label.clone(),
                    similarity,
                });
            }
        }
        Ok(best)
    }

    /// Category labels in index order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    pub fn entries(&self) -> &[(String, Vec<f32>)] {
        &self.entries
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Dot product; inputs are unit vectors, so this is cosine similarity.
fn cosine_sim(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// L2-normalize a vector in place.
pub(crate) fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic 4-dim embedder: fixed vectors per known phrase.
    struct StubEmbedder;

    impl StubEmbedder {
        fn vector_for(text: &str) -> Vec<f32> {
            match text {
                t if t.contains("fuel") => vec![1.0, 0.0, 0.0, 0.0],
                t if t.contains("food") => vec![0.0, 1.0, 0.0, 0.0],
                t if t.contains("mixed") => {
                    let d = 1.0 / 2.0f32.sqrt();
                    vec![d, d, 0.0, 0.0]
                }
                _ => vec![0.0, 0.0, 1.0, 0.0],
            }
        }
    }

    impl Embedder for StubEmbedder {
        fn dim(&self) -> usize {
            4
        }

        fn embed(&self, text: &str) -> Result<Vec<f32>, AiError> {
            Ok(Self::vector_for(text))
        }
    }

    #[test]
    fn build_means_and_renormalizes() {
        let idx = CentroidIndex::build(
            &StubEmbedder,
            &["fuel a", "fuel b", "food x"],
            &["Fuel", "Fuel", "Food"],
        )
        .unwrap();

        assert_eq!(idx.len(), 2);
        let fuel = &idx.entries()[0];
        assert_eq!(fuel.0, "Fuel");
        assert!((fuel.1[0] - 1.0).abs() < 1e-5);
        let norm: f32 = fuel.1.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn first_seen_label_order() {
        let idx = CentroidIndex::build(
            &StubEmbedder,
            &["food x", "fuel a", "food y"],
            &["Food", "Fuel", "Food"],
        )
        .unwrap();
        let labels: Vec<&str> = idx.labels().collect();
        assert_eq!(labels, ["Food", "Fuel"]);
    }

    #[test]
    fn match_best_picks_nearest() {
        let idx = CentroidIndex::build(&StubEmbedder, &["fuel", "food"], &["Fuel", "Food"]).unwrap();

        let hit = idx.match_best(&StubEmbedder, "fuel refill").unwrap().unwrap();
        assert_eq!(hit.category, "Fuel");
        assert!((hit.similarity - 1.0).abs() < 1e-5);

        // Equidistant query: similarity ≈ 0.707 to both; first entry wins.
        let hit = idx.match_best(&StubEmbedder, "mixed").unwrap().unwrap();
        assert_eq!(hit.category, "Fuel");
        assert!((hit.similarity - 0.7071).abs() < 1e-3);
    }

    #[test]
    fn empty_index_matches_nothing() {
        let idx = CentroidIndex::from_entries(vec![], 4).unwrap();
        assert!(idx.match_best(&StubEmbedder, "fuel").unwrap().is_none());
        let hits = idx.match_batch(&StubEmbedder, &["a", "b"]).unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(Option::is_none));
    }

    #[test]
    fn match_batch_aligns_with_inputs() {
        let idx = CentroidIndex::build(&StubEmbedder, &["fuel", "food"], &["Fuel", "Food"]).unwrap();
        let hits = idx
            .match_batch(&StubEmbedder, &["food order", "fuel refill"])
            .unwrap();
        assert_eq!(hits[0].as_ref().unwrap().category, "Food");
        assert_eq!(hits[1].as_ref().unwrap().category, "Fuel");
    }

    #[test]
    fn misaligned_inputs_rejected() {
        let err = CentroidIndex::build(&StubEmbedder, &["a"], &["X", "Y"]).unwrap_err();
        assert!(matches!(err, AiError::LengthMismatch { texts: 1, labels: 2 }));
    }

    #[test]
    fn dimension_mismatch_rejected() {
        let err = CentroidIndex::from_entries(vec![("Fuel".into(), vec![1.0; 3])], 4).unwrap_err();
        assert!(matches!(err, AiError::DimensionMismatch { expected: 4, got: 3 }));
    }
}
