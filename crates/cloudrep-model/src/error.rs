use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown bootstrap step: '{0}' (expected: create|upload|setup|all)")]
    UnknownBootstrap(String),

    #[error("unknown benchmark: '{0}' (expected: cpu|io|net|tpcc|all)")]
    UnknownBenchmark(String),

    #[error("unknown run status: {0}")]
    UnknownStatus(String),

    #[error("invalid model: {0}")]
    Invalid(String),

    #[error("malformed document: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub type ModelResult<T> = Result<T, ModelError>;
