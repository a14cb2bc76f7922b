//! Rule evaluation: score every category against every text variant, keep
//! the strict best.

use spendlens_core::RuleMatch;

use crate::fuzzy::{fuzzy_best, FUZZY_THRESHOLD};
use crate::table::{CompiledRule, RuleTable};

/// Deterministic lexical matcher over a compiled [`RuleTable`].
pub struct RuleEngine {
    table: RuleTable,
}

impl RuleEngine {
    pub fn new(table: RuleTable) -> Self {
        Self { table }
    }

    /// Engine over the built-in rule table.
    pub fn with_builtin() -> Self {
        Self::new(RuleTable::builtin())
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    /// Evaluate the table against a raw text and an optional cleaned variant.
    ///
    /// Both variants are lower-cased; the cleaned variant is skipped when it
    /// equals the raw one. The strictly highest score across all variants
    /// wins — equal scores keep the first-seen winner, so ties break on
    /// variant order first and declared category order second. Returns `None`
    /// when nothing scored, or when the normalized confidence falls below
    /// `min_confidence`.
    pub fn evaluate(
        &self,
        raw_text: &str,
        clean_text: Option<&str>,
        min_confidence: f32,
    ) -> Option<RuleMatch> {
        let mut variants: Vec<String> = Vec::with_capacity(2);
        if !raw_text.is_empty() {
            variants.push(raw_text.to_lowercase());
        }
        if let Some(clean) = clean_text {
            let lowered = clean.to_lowercase();
            if !lowered.is_empty() && !variants.contains(&lowered) {
                variants.push(lowered);
            }
        }

        let mut best: Option<(f32, &CompiledRule, Vec<String>)> = None;
        for text in &variants {
            for rule in &self.table.rules {
                let (score, matched) = score_rule(text, rule);
                if score > best.as_ref().map_or(0.0, |(s, _, _)| *s) {
                    best = Some((score, rule, matched));
                }
            }
        }

        let (score, rule, matched_terms) = best?;
        let confidence = (score / rule.confidence_norm).min(1.0);
        if confidence < min_confidence {
            return None;
        }

        Some(RuleMatch {
            category: rule.category.clone(),
            confidence,
            score,
            matched_terms,
        })
    }
}

/// Accumulate one category's evidence for one text variant.
///
/// Keywords are worth 1.0, patterns 1.5 (higher specificity), and at most one
/// fuzzy candidate contributes the category's fuzzy weight.
fn score_rule(text: &str, rule: &CompiledRule) -> (f32, Vec<String>) {
    let mut score = 0.0;
    let mut matched = Vec::new();

    for keyword in &rule.keywords {
        if text.contains(keyword.as_str()) {
            score += 1.0;
            matched.push(keyword.clone());
        }
    }

    for (source, re) in &rule.patterns {
        if re.is_match(text) {
            score += 1.5;
            matched.push(source.clone());
        }
    }

    if !rule.fuzzy.is_empty()
        && let Some((candidate, _)) = fuzzy_best(text, &rule.fuzzy, FUZZY_THRESHOLD)
    {
        score += rule.fuzzy_weight;
        matched.push(candidate.to_string());
    }

    (score, matched)
}
