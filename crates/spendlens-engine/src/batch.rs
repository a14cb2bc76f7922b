//! Batch runner: the single-item cascade vectorized over many inputs.
//!
//! Rules run for every item first (cheap); the classifier then sees all
//! still-pending items in one batched call, and the embedder only the items
//! the classifier left unresolved. Pure performance partitioning — per-item
//! outcomes are identical to [`CascadeClassifier::classify`], and output
//! order always matches input order.

use spendlens_core::{preprocess, Decision, RuleMatch, Strategy, FALLBACK_CATEGORY};

use crate::cascade::{combine_signals, decision, rules_only_outcome, CascadeClassifier};
use crate::error::EngineError;

impl CascadeClassifier {
    /// Classify many raw texts, order-preserving.
    ///
    /// Inputs are validated up front: one blank item fails the whole batch
    /// before any tier runs.
    pub fn classify_batch(&self, raw_texts: &[&str]) -> Result<Vec<Decision>, EngineError> {
        if let Some(index) = raw_texts.iter().position(|t| t.trim().is_empty()) {
            return Err(EngineError::EmptyBatchItem { index });
        }
        if raw_texts.is_empty() {
            return Ok(vec![]);
        }

        let n = raw_texts.len();
        let (config, centroids) = self.snapshot();
        let cleans: Vec<String> = raw_texts.iter().map(|t| preprocess::clean(t)).collect();

        let mut outputs: Vec<Option<Decision>> = vec![None; n];
        let mut rule_matches: Vec<Option<RuleMatch>> = Vec::with_capacity(n);
        let mut pending: Vec<usize> = Vec::new();

        // Tier 1 for everyone.
        for i in 0..n {
            let rule_match =
                self.rules()
                    .evaluate(raw_texts[i], Some(&cleans[i]), config.rule_min_confidence);
            if let Some(rule) = &rule_match
                && rule.confidence >= config.rule_threshold
            {
                outputs[i] = Some(decision(
                    rule.category.clone(),
                    rule.confidence,
                    Strategy::Rule,
                    cleans[i].clone(),
                    rule_match.clone(),
                    None,
                    None,
                ));
            } else {
                pending.push(i);
            }
            rule_matches.push(rule_match);
        }

        // Tier 2: one batched inference over the pending subset.
        if !pending.is_empty() {
            let ml_outputs = self.classifier().and_then(|classifier| {
                let texts: Vec<&str> = pending.iter().map(|&i| cleans[i].as_str()).collect();
                match classifier.classify_batch(&texts) {
                    Ok(outputs) if outputs.len() == texts.len() => Some(outputs),
                    Ok(outputs) => {
                        tracing::warn!(
                            expected = texts.len(),
                            got = outputs.len(),
                            "classifier batch output misaligned; degrading to rules"
                        );
                        None
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "classifier tier failed; degrading to rules");
                        None
                    }
                }
            });

            match ml_outputs {
                None => {
                    for &i in &pending {
                        let (category, confidence, strategy) =
                            rules_only_outcome(&config, rule_matches[i].as_ref());
                        outputs[i] = Some(decision(
                            category,
                            confidence,
                            strategy,
                            cleans[i].clone(),
                            rule_matches[i].clone(),
                            None,
                            None,
                        ));
                    }
                }
                Some(ml_outputs) => {
                    // Resolve confident ML answers, keep the rest for tier 3.
                    let mut low: Vec<(usize, spendlens_core::ClassifierOutput)> = Vec::new();
                    for (local, &global) in pending.iter().enumerate() {
                        let ml = ml_outputs[local].clone();
                        if ml.confidence >= config.ml_threshold {
                            outputs[global] = Some(decision(
                                ml.category.clone(),
                                ml.confidence,
                                Strategy::Ml,
                                cleans[global].clone(),
                                rule_matches[global].clone(),
                                Some(ml),
                                None,
                            ));
                        } else {
                            low.push((global, ml));
                        }
                    }

                    if !low.is_empty() {
                        match self.embedder().zip(centroids.as_ref()) {
                            None => {
                                // Semantic tier unavailable: ML answers stand.
                                for (global, ml) in low {
                                    outputs[global] = Some(decision(
                                        ml.category.clone(),
                                        ml.confidence,
                                        Strategy::Ml,
                                        cleans[global].clone(),
                                        rule_matches[global].clone(),
                                        Some(ml),
                                        None,
                                    ));
                                }
                            }
                            Some((embedder, index)) => {
                                let texts: Vec<&str> =
                                    low.iter().map(|(i, _)| cleans[*i].as_str()).collect();
                                let embeds = match index.match_batch(embedder.as_ref(), &texts) {
                                    Ok(embeds) => embeds,
                                    Err(err) => {
                                        tracing::warn!(
                                            error = %err,
                                            "embedding tier failed; treating as no match"
                                        );
                                        vec![None; texts.len()]
                                    }
                                };

                                for ((global, ml), embed) in low.into_iter().zip(embeds) {
                                    let (category, confidence, strategy) = combine_signals(
                                        &config,
                                        rule_matches[global].as_ref(),
                                        &ml,
                                        embed.as_ref(),
                                    );
                                    outputs[global] = Some(decision(
                                        category,
                                        confidence,
                                        strategy,
                                        cleans[global].clone(),
                                        rule_matches[global].clone(),
                                        Some(ml),
                                        embed,
                                    ));
                                }
                            }
                        }
                    }
                }
            }
        }

        // Safety net: anything still unresolved gets the sentinel.
        Ok(outputs
            .into_iter()
            .enumerate()
            .map(|(i, output)| {
                output.unwrap_or_else(|| {
                    decision(
                        FALLBACK_CATEGORY.to_string(),
                        config.fallback_confidence,
                        Strategy::Fallback,
                        cleans[i].clone(),
                        rule_matches[i].clone(),
                        None,
                        None,
                    )
                })
            })
            .collect())
    }
}
