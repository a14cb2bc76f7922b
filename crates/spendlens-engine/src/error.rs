use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Empty/blank input — rejected before any tier runs.
    #[error("input text is empty")]
    EmptyInput,

    /// One blank item fails the whole batch; nothing was classified.
    #[error("batch item {index} is empty")]
    EmptyBatchItem { index: usize },

    #[error(transparent)]
    Ai(#[from] spendlens_ai::AiError),
}
