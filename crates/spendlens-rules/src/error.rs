use thiserror::Error;

#[derive(Debug, Error)]
pub enum RulesError {
    /// A category's regex failed to compile. Fatal at load: skipping the
    /// category would silently change classification behavior.
    #[error("invalid pattern {pattern:?} for category {category:?}: {source}")]
    InvalidPattern {
        category: String,
        pattern: String,
        source: regex::Error,
    },

    #[error("rule table is empty")]
    EmptyTable,

    #[error("duplicate category {0:?} in rule table")]
    DuplicateCategory(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed rule table: {0}")]
    Json(#[from] serde_json::Error),
}
