use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("chain is empty")]
    Empty,

    #[error("block {index} does not link to its predecessor")]
    BrokenLink { index: usize },

    #[error("serialisation error: {0}")]
    Serialisation(#[from] serde_json::Error),
}
