//! Execution runtime: cluster operations, the per-target driver and the
//! escalation controller.
mod error;
pub use error::{ExecError, ExecResult};

pub mod cluster;
pub use cluster::{ClusterOps, CommandLine, CreateSpec, LogConfig, NodeSelector, Roachprod};

mod task;
pub use task::{TaskHandle, WaitOutcome};

pub mod orchestrate;
pub use orchestrate::{BenchExtras, Driver, DriverOptions, Phase};

pub mod escalate;
pub use escalate::{
    CockroachWorkload, EscalateOptions, EscalationController, RecordStore, RunLease, Workload,
    wait_for_run,
};
