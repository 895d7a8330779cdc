use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use cloudrep_model::{RunRecord, RunStatus};

use crate::error::ExecResult;

/// File name of the run record inside the results directory.
pub const RUN_RECORD_FILE: &str = "run.json";

/// Persists the [`RunRecord`] of an escalation run next to its level reports.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(results_dir: &Path) -> Self {
        Self {
            path: results_dir.join(RUN_RECORD_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the record on disk; readers never observe a partial file.
    pub fn save(&self, record: &RunRecord) -> ExecResult<()> {
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(record)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Current record, or `None` when no run has written one yet.
    pub fn load(&self) -> ExecResult<Option<RunRecord>> {
        match fs::read(&self.path) {
            Ok(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether the stored run finished successfully.
    pub fn succeeded(&self) -> ExecResult<bool> {
        Ok(self
            .load()?
            .is_some_and(|r| r.status == RunStatus::Succeeded))
    }
}
