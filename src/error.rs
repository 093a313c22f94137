use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The training corpus did not contain a single `word/tag` entry.
    #[error("empty training corpus")]
    EmptyCorpus,

    /// Predicted and gold token sequences are not positionally aligned.
    /// `position` is the first token whose words differ.
    #[error("misaligned evaluation: {predicted} predicted tokens vs {gold} gold tokens, first differing word at token #{position}")]
    Misaligned { predicted: usize, gold: usize, position: usize },

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
