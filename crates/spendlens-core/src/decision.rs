//! Decision types shared across the cascade tiers.
//!
//! Each tier produces a transient result (`RuleMatch`, `ClassifierOutput`,
//! `EmbedMatch`); the engine folds them into a terminal [`Decision`] carrying
//! the winning category, a confidence in [0,1], the strategy tag, and the
//! full [`DecisionTrace`] for auditing. Nothing here is persisted by the
//! core.

use serde::{Deserialize, Serialize};

/// Which tier (or blend rule) produced the final answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Strategy {
    /// Near-certain lexical match, short-circuited before the model ran.
    Rule,
    /// Classifier confidence cleared the ML threshold.
    Ml,
    /// Classifier and centroid agree; blended confidence.
    Hybrid,
    /// Centroid overrode a less confident classifier.
    EmbedFallback,
    /// Low-but-usable rule match kept after the model disappointed.
    RuleLow,
    /// No tier produced a trustworthy answer; sentinel category.
    Fallback,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rule => "RULE",
            Self::Ml => "ML",
            Self::Hybrid => "HYBRID",
            Self::EmbedFallback => "EMBED_FALLBACK",
            Self::RuleLow => "RULE_LOW",
            Self::Fallback => "FALLBACK",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of evaluating the rule table against one input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleMatch {
    pub category: String,
    /// `min(score / confidence_norm, 1.0)`.
    pub confidence: f32,
    /// Raw accumulated keyword/pattern/fuzzy score.
    pub score: f32,
    /// Keywords, patterns, and fuzzy phrases that fired, for audit.
    pub matched_terms: Vec<String>,
}

/// Result of the learned classifier on one input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierOutput {
    pub category: String,
    /// Max softmax probability.
    pub confidence: f32,
    /// Full distribution over the classifier's label set, summing to 1.
    pub probabilities: Vec<f32>,
}

/// Best centroid hit for one input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedMatch {
    pub category: String,
    /// Cosine similarity against the winning centroid.
    pub similarity: f32,
}

/// Full audit record for one classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTrace {
    /// Cleaned text variant the model tiers saw.
    pub clean_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<RuleMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ml: Option<ClassifierOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<EmbedMatch>,
}

/// Terminal output of the cascade for one input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub category: String,
    pub confidence: f32,
    pub strategy: Strategy,
    pub trace: DecisionTrace,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_wire_form() {
        for (s, wire) in [
            (Strategy::Rule, "\"RULE\""),
            (Strategy::Ml, "\"ML\""),
            (Strategy::Hybrid, "\"HYBRID\""),
            (Strategy::EmbedFallback, "\"EMBED_FALLBACK\""),
            (Strategy::RuleLow, "\"RULE_LOW\""),
            (Strategy::Fallback, "\"FALLBACK\""),
        ] {
            assert_eq!(serde_json::to_string(&s).unwrap(), wire);
            assert_eq!(format!("\"{s}\""), wire);
            let parsed: Strategy = serde_json::from_str(wire).unwrap();
            assert_eq!(parsed, s);
        }
    }

    #[test]
    fn trace_omits_absent_tiers() {
        let decision = Decision {
            category: "Others".into(),
            confidence: 0.35,
            strategy: Strategy::Fallback,
            trace: DecisionTrace {
                clean_text: "some text".into(),
                rule: None,
                ml: None,
                embedding: None,
            },
        };
        let json = serde_json::to_string(&decision).unwrap();
        assert!(!json.contains("\"rule\""));
        assert!(!json.contains("\"ml\""));
        assert!(!json.contains("\"embedding\""));
    }
}
