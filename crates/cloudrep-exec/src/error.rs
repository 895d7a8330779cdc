use std::path::PathBuf;

use cloudrep_model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("command `{command}` failed with {}: {output}", exit_label(*code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        /// Head of stderr, then the tail of stdout.
        output: String,
    },

    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("run already in progress (marker {}, pid {})", path.display(), pid_label(*pid))]
    LeaseHeld { path: PathBuf, pid: Option<u32> },

    #[error("benchmark {benchmark} is no longer running and did not complete")]
    ProcessGone { benchmark: String },

    #[error("canceled")]
    Canceled,

    #[error("invalid specification: {0}")]
    InvalidSpec(String),

    #[error("invalid model: {0}")]
    Model(#[from] ModelError),

    #[error("malformed run record: {0}")]
    Record(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ExecResult<T> = Result<T, ExecError>;

fn exit_label(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "a signal".to_string(),
    }
}

fn pid_label(pid: Option<u32>) -> String {
    pid.map_or_else(|| "unknown".to_string(), |p| p.to_string())
}
