//! Cascade thresholds and tuning constants.

use serde::{Deserialize, Serialize};

/// Numeric contract of the cascade. Downstream persistence decisions
/// (save-vs-ask-user) key off the final confidence, so these values are part
/// of the engine's public behavior, not internal tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeConfig {
    /// Rule confidence at or above which the cascade terminates immediately.
    pub rule_threshold: f32,
    /// Classifier confidence at or above which the cascade terminates.
    pub ml_threshold: f32,
    /// Centroid similarity below which the semantic tier is distrusted.
    pub embed_threshold: f32,
    /// Floor passed to the rule engine; weaker matches are discarded.
    pub rule_min_confidence: f32,
    /// Fixed confidence reported with the sentinel fallback category.
    pub fallback_confidence: f32,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            rule_threshold: 0.90,
            ml_threshold: 0.70,
            embed_threshold: 0.60,
            rule_min_confidence: 0.50,
            fallback_confidence: 0.35,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_contract() {
        let cfg = CascadeConfig::default();
        assert_eq!(cfg.rule_threshold, 0.90);
        assert_eq!(cfg.ml_threshold, 0.70);
        assert_eq!(cfg.embed_threshold, 0.60);
        assert_eq!(cfg.rule_min_confidence, 0.50);
        assert_eq!(cfg.fallback_confidence, 0.35);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: CascadeConfig = serde_json::from_str(r#"{"ml_threshold": 0.8}"#).unwrap();
        assert_eq!(cfg.ml_threshold, 0.8);
        assert_eq!(cfg.rule_threshold, 0.90);
    }
}
