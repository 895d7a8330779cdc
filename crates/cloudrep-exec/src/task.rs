use std::{fmt, time::Duration};

use cloudrep_model::Benchmark;
use tracing::trace;

use crate::{
    cluster::{ClusterOps, NodeSelector},
    error::{ExecError, ExecResult},
};

/// EX_TEMPFAIL: try again later.
const STILL_RUNNING_EXIT: u8 = 75;

/// Result of waiting on a background task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Finished and left a success record.
    Completed,
    /// Still running when the timeout elapsed.
    StillRunning,
    /// The tracked process exited without completing.
    ProcessGone,
}

impl WaitOutcome {
    /// Process exit code reported by wait mode.
    pub fn exit_code(&self) -> u8 {
        match self {
            WaitOutcome::Completed => 0,
            WaitOutcome::ProcessGone => 1,
            WaitOutcome::StillRunning => STILL_RUNNING_EXIT,
        }
    }
}

impl fmt::Display for WaitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WaitOutcome::Completed => "completed",
            WaitOutcome::StillRunning => "still-running",
            WaitOutcome::ProcessGone => "process-gone",
        })
    }
}

/// A benchmark running in a detached session on a cluster node.
///
/// Obtained from starting the benchmark, or re-attached on resume. Waiting runs
/// the benchmark's runner in wait mode on the node that hosts it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskHandle {
    benchmark: Benchmark,
    node: NodeSelector,
}

impl TaskHandle {
    pub fn attach(benchmark: Benchmark, node: NodeSelector) -> Self {
        Self { benchmark, node }
    }

    pub fn benchmark(&self) -> Benchmark {
        self.benchmark
    }

    pub fn node(&self) -> &NodeSelector {
        &self.node
    }

    /// The runner split into words, followed by `-w`.
    pub fn wait_command(&self) -> Vec<String> {
        self.benchmark
            .runner()
            .split_whitespace()
            .chain(std::iter::once("-w"))
            .map(String::from)
            .collect()
    }

    /// Block until the benchmark finishes, fails, or `timeout` elapses.
    ///
    /// Exit code 75 of the runner's wait mode means it gave up while the
    /// benchmark is still running. Any other non-zero exit means the benchmark
    /// process is gone without a success record; other errors (spawn, I/O) are
    /// returned.
    pub async fn wait(
        &self,
        ops: &dyn ClusterOps,
        timeout: Option<Duration>,
    ) -> ExecResult<WaitOutcome> {
        let command = self.wait_command();
        let fut = ops.run(&self.node, &command);

        let res = match timeout {
            Some(limit) => match tokio::time::timeout(limit, fut).await {
                Ok(res) => res,
                Err(_) => return Ok(WaitOutcome::StillRunning),
            },
            None => fut.await,
        };

        match res {
            Ok(_) => Ok(WaitOutcome::Completed),
            Err(ExecError::CommandFailed {
                code: Some(code), ..
            }) if code == i32::from(STILL_RUNNING_EXIT) => Ok(WaitOutcome::StillRunning),
            Err(ExecError::CommandFailed { command, code, .. }) => {
                trace!(benchmark = %self.benchmark, command, ?code, "wait command failed");
                Ok(WaitOutcome::ProcessGone)
            }
            Err(e) => Err(e),
        }
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.benchmark, self.node)
    }
}
