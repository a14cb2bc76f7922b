//! Deterministic rule tier: keyword, pattern, and fuzzy phrase matching that
//! short-circuits obvious categories before the model is invoked.

mod engine;
mod error;
mod fuzzy;
mod table;

pub use engine::RuleEngine;
pub use error::RulesError;
pub use fuzzy::{fuzzy_best, token_set_ratio, FUZZY_THRESHOLD};
pub use table::{RuleSpec, RuleTable};
