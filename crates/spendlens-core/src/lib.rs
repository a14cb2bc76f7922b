pub mod category;
pub mod config;
pub mod decision;
pub mod preprocess;

pub use category::{CategoryRegistry, CategorySnapshot, FALLBACK_CATEGORY};
pub use config::CascadeConfig;
pub use decision::{ClassifierOutput, Decision, DecisionTrace, EmbedMatch, RuleMatch, Strategy};
