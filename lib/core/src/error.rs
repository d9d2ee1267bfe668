use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Corpus is empty")]
    EmptyCorpus,

    #[error("No terms left after stop-word filtering")]
    EmptyVocabulary,

    #[error("Batch {batch} failed: {reason}")]
    BatchCompute { batch: usize, reason: String },

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Errors raised while building a session. The session cannot serve.
    pub fn is_construction(&self) -> bool {
        matches!(self, Error::EmptyCorpus | Error::EmptyVocabulary)
    }
}
