//! Cascade controller: rules → classifier → centroids, early termination,
//! and the confidence-blending policy.
//!
//! Per input the state machine is `RULE_CHECK → (resolved | ML_CHECK) →
//! (resolved | EMBED_CHECK) → resolved`; every call terminates with exactly
//! one `(category, confidence, strategy)`. Tier failures degrade — a broken
//! model never propagates as a classification failure.

use std::sync::{Arc, RwLock};

use spendlens_ai::{CentroidIndex, Embedder, ModelGeneration, TextClassifier};
use spendlens_core::{
    preprocess, CascadeConfig, CategoryRegistry, ClassifierOutput, Decision, DecisionTrace,
    EmbedMatch, RuleMatch, Strategy, FALLBACK_CATEGORY,
};
use spendlens_rules::RuleEngine;

use crate::error::EngineError;

/// Floor for the soft-trust `RULE_LOW` branch. Fixed by the decision
/// contract, deliberately not tied to `rule_min_confidence`.
const SOFT_RULE_FLOOR: f32 = 0.5;

/// Thresholds and centroids swap together: both belong to one trained
/// generation, and readers must never mix two generations.
struct SharedState {
    config: CascadeConfig,
    centroids: Option<Arc<CentroidIndex>>,
}

/// The hybrid classification engine.
///
/// Stateless per call; `&self` throughout and `Send + Sync`, so one instance
/// serves concurrent callers. The classifier and embedder are optional — the
/// engine stays usable from cold start, degrading per the documented policy.
pub struct CascadeClassifier {
    rules: RuleEngine,
    registry: CategoryRegistry,
    classifier: Option<Arc<dyn TextClassifier>>,
    embedder: Option<Arc<dyn Embedder>>,
    shared: RwLock<SharedState>,
}

impl CascadeClassifier {
    /// Cold-start engine: rules only, no model, no centroids.
    pub fn new(rules: RuleEngine, config: CascadeConfig) -> Self {
        let registry = CategoryRegistry::new(rules.table().categories().map(str::to_string));
        Self {
            rules,
            registry,
            classifier: None,
            embedder: None,
            shared: RwLock::new(SharedState {
                config,
                centroids: None,
            }),
        }
    }

    /// Attach a trained classifier; its labels join the registry.
    pub fn with_classifier(mut self, classifier: Arc<dyn TextClassifier>) -> Self {
        for label in classifier.labels() {
            self.registry.register(label);
        }
        self.classifier = Some(classifier);
        self
    }

    /// Attach a sentence embedder for the semantic fallback tier.
    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Swap in a centroid index. Readers mid-call keep the `Arc` they
    /// already took; new calls see the new index.
    pub fn set_centroids(&self, index: Option<Arc<CentroidIndex>>) {
        if let Some(index) = &index {
            for label in index.labels() {
                self.registry.register(label);
            }
        }
        let mut guard = self.shared.write().expect("cascade state lock poisoned");
        guard.centroids = index;
    }

    /// Apply a persisted training generation: thresholds and centroid table
    /// in one swap, labels registered.
    pub fn install_generation(&self, generation: &ModelGeneration) -> Result<(), EngineError> {
        let index = generation.centroid_index()?;
        for label in &generation.labels {
            self.registry.register(label);
        }
        let mut guard = self.shared.write().expect("cascade state lock poisoned");
        guard.config = generation.config;
        guard.centroids = Some(Arc::new(index));
        tracing::info!(
            labels = generation.labels.len(),
            centroids = generation.centroids.len(),
            "generation installed"
        );
        Ok(())
    }

    /// Current thresholds.
    pub fn config(&self) -> CascadeConfig {
        self.shared.read().expect("cascade state lock poisoned").config
    }

    /// Registry of known categories.
    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    /// Currently known category labels, registration order.
    pub fn labels(&self) -> Vec<String> {
        self.registry.snapshot().labels().to_vec()
    }

    /// Classify one raw notification text.
    pub fn classify(&self, raw_text: &str) -> Result<Decision, EngineError> {
        self.classify_with_clean(raw_text, None)
    }

    /// Classify with an optional precomputed clean variant; computed lazily
    /// via [`preprocess::clean`] when absent.
    pub fn classify_with_clean(
        &self,
        raw_text: &str,
        clean_text: Option<&str>,
    ) -> Result<Decision, EngineError> {
        if raw_text.trim().is_empty() {
            return Err(EngineError::EmptyInput);
        }
        let clean = match clean_text {
            Some(c) if !c.trim().is_empty() => c.to_string(),
            _ => preprocess::clean(raw_text),
        };
        let (config, centroids) = self.snapshot();

        // Tier 1: rules. A near-certain lexical match ends the cascade.
        let rule_match = self
            .rules
            .evaluate(raw_text, Some(&clean), config.rule_min_confidence);
        if let Some(rule) = &rule_match
            && rule.confidence >= config.rule_threshold
        {
            return Ok(decision(
                rule.category.clone(),
                rule.confidence,
                Strategy::Rule,
                clean,
                rule_match.clone(),
                None,
                None,
            ));
        }

        // Tier 2: learned classifier.
        let ml = match &self.classifier {
            Some(classifier) => match classifier.classify(&clean) {
                Ok(output) => Some(output),
                Err(err) => {
                    tracing::warn!(error = %err, "classifier tier failed; degrading to rules");
                    None
                }
            },
            None => None,
        };
        let Some(ml) = ml else {
            // Centroids are built against the classifier's training pass; with
            // no classifier output they are not consulted.
            let (category, confidence, strategy) = rules_only_outcome(&config, rule_match.as_ref());
            return Ok(decision(category, confidence, strategy, clean, rule_match, None, None));
        };

        if ml.confidence >= config.ml_threshold {
            return Ok(decision(
                ml.category.clone(),
                ml.confidence,
                Strategy::Ml,
                clean,
                rule_match,
                Some(ml),
                None,
            ));
        }

        // Tier 3: semantic fallback.
        let Some((embedder, index)) = self.embedder.as_ref().zip(centroids.as_ref()) else {
            // Semantic tier unavailable: the ML answer stands at its own
            // confidence even below threshold.
            return Ok(decision(
                ml.category.clone(),
                ml.confidence,
                Strategy::Ml,
                clean,
                rule_match,
                Some(ml),
                None,
            ));
        };
        let embed = match index.match_best(embedder.as_ref(), &clean) {
            Ok(hit) => hit,
            Err(err) => {
                tracing::warn!(error = %err, "embedding tier failed; treating as no match");
                None
            }
        };

        let (category, confidence, strategy) =
            combine_signals(&config, rule_match.as_ref(), &ml, embed.as_ref());
        Ok(decision(category, confidence, strategy, clean, rule_match, Some(ml), embed))
    }

    pub(crate) fn snapshot(&self) -> (CascadeConfig, Option<Arc<CentroidIndex>>) {
        let guard = self.shared.read().expect("cascade state lock poisoned");
        (guard.config, guard.centroids.clone())
    }

    pub(crate) fn rules(&self) -> &RuleEngine {
        &self.rules
    }

    pub(crate) fn classifier(&self) -> Option<&Arc<dyn TextClassifier>> {
        self.classifier.as_ref()
    }

    pub(crate) fn embedder(&self) -> Option<&Arc<dyn Embedder>> {
        self.embedder.as_ref()
    }
}

/// Fold the three signals into a terminal answer once tier 3 has run.
///
/// The weights and caps here are the engine's numeric contract: downstream
/// save-vs-ask decisions key off the final confidence value.
pub(crate) fn combine_signals(
    config: &CascadeConfig,
    rule: Option<&RuleMatch>,
    ml: &ClassifierOutput,
    embed: Option<&EmbedMatch>,
) -> (String, f32, Strategy) {
    let rule_conf = rule.map_or(0.0, |r| r.confidence);

    let Some(embed) = embed.filter(|e| e.similarity >= config.embed_threshold) else {
        if ml.confidence >= config.ml_threshold {
            return (ml.category.clone(), ml.confidence, Strategy::Ml);
        }
        if let Some(rule) = rule
            && rule.confidence >= SOFT_RULE_FLOOR
        {
            return (rule.category.clone(), rule.confidence, Strategy::RuleLow);
        }
        return (
            FALLBACK_CATEGORY.to_string(),
            config.fallback_confidence,
            Strategy::Fallback,
        );
    };

    if embed.category == ml.category {
        // Agreement between independent signals increases trust.
        let boosted = (0.5 * ml.confidence + 0.3 * embed.similarity + 0.2 * rule_conf).min(0.99);
        return (ml.category.clone(), boosted, Strategy::Hybrid);
    }

    if embed.similarity > ml.confidence {
        let blended = (0.6 * embed.similarity + 0.2 * ml.confidence + 0.2 * rule_conf).min(0.95);
        return (embed.category.clone(), blended, Strategy::EmbedFallback);
    }

    if ml.confidence >= config.ml_threshold {
        return (ml.category.clone(), ml.confidence, Strategy::Ml);
    }
    (
        FALLBACK_CATEGORY.to_string(),
        ml.confidence.max(embed.similarity) * 0.9,
        Strategy::Fallback,
    )
}

/// Terminal outcome when only the rule tier is usable.
pub(crate) fn rules_only_outcome(
    config: &CascadeConfig,
    rule: Option<&RuleMatch>,
) -> (String, f32, Strategy) {
    match rule {
        Some(rule) => (rule.category.clone(), rule.confidence, Strategy::Rule),
        None => (
            FALLBACK_CATEGORY.to_string(),
            config.fallback_confidence,
            Strategy::Fallback,
        ),
    }
}

pub(crate) fn decision(
    category: String,
    confidence: f32,
    strategy: Strategy,
    clean_text: String,
    rule: Option<RuleMatch>,
    ml: Option<ClassifierOutput>,
    embedding: Option<EmbedMatch>,
) -> Decision {
    Decision {
        category,
        confidence,
        strategy,
        trace: DecisionTrace {
            clean_text,
            rule,
            ml,
            embedding,
        },
    }
}
