use std::{fmt, path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    LevelVerdict,
    error::{ModelError, ModelResult},
};

/// Lifecycle state of an escalation run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunStatus {
    Running,
    /// Finished with interpretable results (ramp exhausted or at least one level passed).
    Succeeded,
    Failed,
    Canceled,
}

impl RunStatus {
    /// Returns `true` once the run will not change state anymore.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Running => "running",
            RunStatus::Succeeded => "succeeded",
            RunStatus::Failed => "failed",
            RunStatus::Canceled => "canceled",
        };
        f.write_str(s)
    }
}

impl FromStr for RunStatus {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "running" => Ok(RunStatus::Running),
            "succeeded" | "success" => Ok(RunStatus::Succeeded),
            "failed" => Ok(RunStatus::Failed),
            "canceled" | "cancelled" => Ok(RunStatus::Canceled),
            other => Err(ModelError::UnknownStatus(other.to_string())),
        }
    }
}

/// Result of one concurrency level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelReport {
    pub level: u32,
    /// Raw workload output for this level.
    pub report: PathBuf,
    pub verdict: LevelVerdict,
}

/// Structured record of an escalation run, persisted next to its level reports.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub status: RunStatus,
    /// Process id that owns the run.
    pub pid: u32,
    /// Unix epoch milliseconds.
    pub started_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at_ms: Option<u64>,
    #[serde(default)]
    pub levels: Vec<LevelReport>,
    /// Failure or cancellation reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl RunRecord {
    pub fn started(pid: u32, now_ms: u64) -> Self {
        Self {
            status: RunStatus::Running,
            pid,
            started_at_ms: now_ms,
            finished_at_ms: None,
            levels: Vec::new(),
            reason: None,
        }
    }

    /// Returns `true` if any recorded level passed.
    pub fn any_passed(&self) -> bool {
        self.levels.iter().any(|l| l.verdict.is_pass())
    }

    /// Move to a terminal state.
    pub fn finish(&mut self, status: RunStatus, now_ms: u64, reason: Option<String>) {
        self.status = status;
        self.finished_at_ms = Some(now_ms);
        self.reason = reason;
    }
}
