//! Rule table: per-category keyword/pattern/fuzzy configuration.
//!
//! The table is an ordered list — category iteration order is the declared
//! insertion order, which makes equal-score tie-breaks deterministic across
//! runs and platforms. A built-in table covers the stock categories; custom
//! tables load from JSON and are validated eagerly.

use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::RulesError;

/// One category's matching configuration, as declared (JSON form).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSpec {
    pub category: String,
    /// Literal tokens scored +1.0 each when found as substrings.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Regex patterns scored +1.5 each.
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Fuzzy phrase candidates; at most one contributes per evaluation.
    #[serde(default)]
    pub fuzzy: Vec<String>,
    #[serde(default = "default_fuzzy_weight")]
    pub fuzzy_weight: f32,
    /// Score at which confidence saturates: `conf = min(score / norm, 1)`.
    /// Categories with noisier vocabularies get a lower norm.
    #[serde(default = "default_confidence_norm")]
    pub confidence_norm: f32,
}

fn default_fuzzy_weight() -> f32 {
    1.0
}

fn default_confidence_norm() -> f32 {
    3.0
}

/// A [`RuleSpec`] with its patterns compiled.
#[derive(Debug)]
pub(crate) struct CompiledRule {
    pub category: String,
    pub keywords: Vec<String>,
    /// Source text kept alongside the compiled regex for audit output.
    pub patterns: Vec<(String, Regex)>,
    pub fuzzy: Vec<String>,
    pub fuzzy_weight: f32,
    pub confidence_norm: f32,
}

/// Ordered, validated set of compiled rules.
#[derive(Debug)]
pub struct RuleTable {
    pub(crate) rules: Vec<CompiledRule>,
}

impl RuleTable {
    /// Compile a declared spec list. Fails on the first invalid pattern or
    /// duplicate category rather than skipping it.
    pub fn compile(specs: Vec<RuleSpec>) -> Result<Self, RulesError> {
        if specs.is_empty() {
            return Err(RulesError::EmptyTable);
        }

        let mut rules: Vec<CompiledRule> = Vec::with_capacity(specs.len());
        for spec in specs {
            if rules.iter().any(|r| r.category == spec.category) {
                return Err(RulesError::DuplicateCategory(spec.category));
            }

            let mut patterns = Vec::with_capacity(spec.patterns.len());
            for pattern in spec.patterns {
                let re = Regex::new(&pattern).map_err(|source| RulesError::InvalidPattern {
                    category: spec.category.clone(),
                    pattern: pattern.clone(),
                    source,
                })?;
                patterns.push((pattern, re));
            }

            rules.push(CompiledRule {
                category: spec.category,
                keywords: spec.keywords.iter().map(|k| k.to_lowercase()).collect(),
                patterns,
                fuzzy: spec.fuzzy,
                fuzzy_weight: spec.fuzzy_weight,
                confidence_norm: spec.confidence_norm,
            });
        }

        tracing::debug!(categories = rules.len(), "rule table compiled");
        Ok(Self { rules })
    }

    /// The stock table covering common Indian payment-notification categories.
    pub fn builtin() -> Self {
        Self::compile(builtin_specs()).expect("built-in rule table is valid")
    }

    /// Load and compile a table from a JSON array of [`RuleSpec`]s.
    pub fn from_json(json: &str) -> Result<Self, RulesError> {
        let specs: Vec<RuleSpec> = serde_json::from_str(json)?;
        Self::compile(specs)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, RulesError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Category names in declared order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.category.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn spec(
    category: &str,
    keywords: &[&str],
    patterns: &[&str],
    fuzzy: &[&str],
    fuzzy_weight: f32,
    confidence_norm: f32,
) -> RuleSpec {
    RuleSpec {
        category: category.to_string(),
        keywords: keywords.iter().map(|s| s.to_string()).collect(),
        patterns: patterns.iter().map(|s| s.to_string()).collect(),
        fuzzy: fuzzy.iter().map(|s| s.to_string()).collect(),
        fuzzy_weight,
        confidence_norm,
    }
}

fn builtin_specs() -> Vec<RuleSpec> {
    vec![
        spec(
            "Fuel",
            &["petrol", "diesel", "pump", "fuel", "hpcl", "bpcl", "indianoil", "ioc"],
            &[r"\bpetrol pump\b", r"\bfuel station\b"],
            &["petrol bunk", "fuel pump", "gas station"],
            1.2,
            3.0,
        ),
        spec(
            "Travel",
            &["uber", "ola", "rapido", "cab", "bus", "metro", "flight", "train", "ticket"],
            &[r"\bflight ticket\b", r"\brail(ticket)?\b", r"\bmetro recharge\b"],
            &["ola cab", "uber trip"],
            1.0,
            4.0,
        ),
        spec(
            "Food",
            &["zomato", "swiggy", "dominos", "pizza", "restaurant", "hotel", "tiffin", "caf"],
            &[r"\bfood order\b", r"\bhotel booking\b"],
            &["restaurent", "restro", "resto"],
            1.0,
            3.5,
        ),
        spec(
            "Bills",
            &["electricity", "power", "bill", "recharge", "phonepe", "phone bill", "gas", "water"],
            &[r"\belectricity bill\b", r"\bmobile recharge\b", r"\bdth recharge\b"],
            &["electric bill", "elec bill"],
            1.1,
            4.0,
        ),
        spec(
            "Shopping",
            &["amazon", "flipkart", "myntra", "ajio", "dmart", "bigbasket", "mall", "store"],
            &[r"\bqr purchase\b", r"\bpos purchase\b"],
            &["amazn", "flip cart"],
            1.0,
            3.5,
        ),
        spec(
            "Healthcare",
            &["hospital", "clinic", "doctor", "pharmacy", "medplus", "lab test"],
            &[r"\bmedical bill\b", r"\bhospital bill\b"],
            &["hosp", "medic"],
            1.0,
            3.0,
        ),
        spec(
            "Education",
            &["school", "college", "tuition", "fees", "university", "coaching"],
            &[r"\btuition fee\b", r"\bexam fee\b"],
            &["tution", "scl fees"],
            1.0,
            3.0,
        ),
        spec(
            "Entertainment",
            &["netflix", "spotify", "movie", "ticketnew", "bookmyshow", "gaming", "psn"],
            &[r"\bmovie ticket\b", r"\bconcert\b"],
            &["bookmy show", "sony liv"],
            1.0,
            3.0,
        ),
        spec(
            "Fund Transfer",
            &["sent to", "transfer", "gpay", "phonepe", "paytm", "upi", "imps", "neft"],
            &[r"\bsent to\b", r"\bto mom\b", r"\btransfer to\b"],
            &["fund transf", "money sent"],
            1.2,
            4.0,
        ),
        spec(
            "Cashback",
            &["cashback", "reward", "offer", "refunded", "credited back"],
            &[r"\bcash ?back\b", r"\brefunded\b"],
            &[],
            0.8,
            2.0,
        ),
        spec(
            "EMI",
            &["emi", "installment", "loan repayment", "equated"],
            &[r"\bloan emi\b", r"\bemi due\b"],
            &["instalment", "auto-debit emi"],
            1.3,
            2.5,
        ),
        spec(
            "Interest",
            &["interest credited", "interest earned", "interest payout", "credit interest"],
            &[r"\binterest (?:credited|earned)\b"],
            &[],
            1.0,
            2.5,
        ),
        spec(
            "ATM Withdrawal",
            &["atm withdrawal", "atm cash", "cash withdrawal", "pos withdrawal"],
            &[r"\batm\b", r"\bpos\b", r"\bcash w/d\b"],
            &["atm wd", "atm cash wd"],
            1.2,
            3.0,
        ),
        spec(
            "Refund",
            &["reversal", "refund", "chargeback", "reversed", "refunded"],
            &[r"\btransaction reversed\b", r"\btxn reversal\b"],
            &["refund issued", "amount reversed"],
            1.0,
            2.5,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_compiles() {
        let table = RuleTable::builtin();
        assert_eq!(table.len(), 14);
        assert_eq!(table.categories().next(), Some("Fuel"));
    }

    #[test]
    fn declared_order_preserved() {
        let json = r#"[
            {"category": "B", "keywords": ["b"]},
            {"category": "A", "keywords": ["a"]}
        ]"#;
        let table = RuleTable::from_json(json).unwrap();
        let cats: Vec<&str> = table.categories().collect();
        assert_eq!(cats, ["B", "A"]);
    }

    #[test]
    fn invalid_pattern_is_fatal() {
        let json = r#"[{"category": "Broken", "patterns": ["[unclosed"]}]"#;
        let err = RuleTable::from_json(json).unwrap_err();
        match err {
            RulesError::InvalidPattern { category, pattern, .. } => {
                assert_eq!(category, "Broken");
                assert_eq!(pattern, "[unclosed");
            }
            other => panic!("expected InvalidPattern, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_category_rejected() {
        let json = r#"[
            {"category": "Fuel", "keywords": ["a"]},
            {"category": "Fuel", "keywords": ["b"]}
        ]"#;
        assert!(matches!(
            RuleTable::from_json(json),
            Err(RulesError::DuplicateCategory(c)) if c == "Fuel"
        ));
    }

    #[test]
    fn empty_table_rejected() {
        assert!(matches!(RuleTable::from_json("[]"), Err(RulesError::EmptyTable)));
    }

    #[test]
    fn spec_defaults_fill_in() {
        let json = r#"[{"category": "Minimal", "keywords": ["x"]}]"#;
        let table = RuleTable::from_json(json).unwrap();
        let rule = &table.rules[0];
        assert_eq!(rule.fuzzy_weight, 1.0);
        assert_eq!(rule.confidence_norm, 3.0);
        assert!(rule.patterns.is_empty());
    }
}
