use std::{path::Path, time::Duration};

use cloudrep_model::RunStatus;
use tokio::time::Instant;
use tracing::debug;

use crate::{
    error::ExecResult,
    escalate::{
        lease::{pid_alive, read_holder},
        record::RecordStore,
    },
    task::WaitOutcome,
};

/// Block until the escalation run in `results_dir` completes, its owning process
/// disappears, or `timeout` elapses.
///
/// Completion means a run record with status `succeeded`. A marker naming a dead
/// (or no) process without such a record is [`WaitOutcome::ProcessGone`], so the
/// wait never outlives the run it tracks. While neither a record nor a live
/// holder exists the run may still be starting; that is tolerated for
/// `start_grace`.
pub async fn wait_for_run(
    results_dir: &Path,
    marker: &Path,
    timeout: Option<Duration>,
    poll: Duration,
    start_grace: Duration,
) -> ExecResult<WaitOutcome> {
    let store = RecordStore::new(results_dir);
    let began = Instant::now();
    let deadline = timeout.map(|t| began + t);

    loop {
        if store.succeeded()? {
            return Ok(WaitOutcome::Completed);
        }

        let holder = read_holder(marker);
        if !holder.is_some_and(pid_alive) {
            // The run may have finished between the two checks.
            let record = store.load()?;
            if record.as_ref().is_some_and(|r| r.status == RunStatus::Succeeded) {
                return Ok(WaitOutcome::Completed);
            }
            if record.is_some() || began.elapsed() >= start_grace {
                debug!(marker = %marker.display(), ?holder, "escalation process is gone");
                return Ok(WaitOutcome::ProcessGone);
            }
            debug!(marker = %marker.display(), "escalation run has not started yet");
        }

        if deadline.is_some_and(|d| Instant::now() >= d) {
            return Ok(WaitOutcome::StillRunning);
        }
        tokio::time::sleep(poll).await;
    }
}
