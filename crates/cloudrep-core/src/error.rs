use std::{io, path::PathBuf};

use cloudrep_model::ModelError;
use thiserror::Error;

/// Failures while parsing or evaluating a `{{ .Field }}` template.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unterminated action starting at byte {0}")]
    Unterminated(usize),

    #[error("unsupported expression '{0}'")]
    BadExpression(String),

    #[error("undefined field '{0}'")]
    UndefinedField(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("error evaluating arg {arg}: {source}")]
    EvalArg { arg: String, source: TemplateError },

    #[error("failed to render script for {target}: {source}")]
    Render { target: String, source: TemplateError },

    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid configuration: {0}")]
    Config(#[from] ModelError),

    #[error("failed to encode target plan: {0}")]
    Encode(#[from] serde_json::Error),
}

impl CoreError {
    /// Name of the argument that failed evaluation, if this is an argument error.
    pub fn offending_arg(&self) -> Option<&str> {
        match self {
            CoreError::EvalArg { arg, .. } => Some(arg),
            _ => None,
        }
    }
}
