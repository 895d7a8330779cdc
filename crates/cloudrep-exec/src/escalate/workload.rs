use std::{fs::File, path::Path};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::{
    cluster::CommandLine,
    error::{ExecError, ExecResult},
};

/// Server settings applied before loading, one SQL statement each.
pub const CAPACITY_SETTINGS: &[&str] = &[
    "SET CLUSTER SETTING kv.dist_sender.concurrency_limit = 2016",
    "SET CLUSTER SETTING kv.snapshot_rebalance.max_rate = '256 MiB'",
    "SET CLUSTER SETTING sql.stats.automatic_collection.enabled = false",
    "SET CLUSTER SETTING kv.range_merge.queue_enabled = false",
];

/// Benchmark workload driven by the escalation controller.
#[async_trait]
pub trait Workload: Send + Sync {
    /// Apply server-side capacity settings.
    async fn tune(&self) -> ExecResult<()>;

    /// One-time data load sized for the highest level.
    async fn load(&self) -> ExecResult<()>;

    /// Run one level to completion, writing its output to `report`.
    async fn run_level(&self, level: u32, report: &Path) -> ExecResult<()>;
}

/// TPC-C through the `cockroach workload` tool.
#[derive(Debug, Clone)]
pub struct CockroachWorkload {
    binary: String,
    endpoints: Vec<String>,
    /// Warehouses loaded; the highest level that can run.
    warehouses: u32,
    /// Per-level run time (e.g. `10m`).
    duration: String,
}

impl CockroachWorkload {
    pub fn new(
        binary: impl Into<String>,
        endpoints: Vec<String>,
        warehouses: u32,
        duration: impl Into<String>,
    ) -> ExecResult<Self> {
        if endpoints.is_empty() {
            return Err(ExecError::InvalidSpec(
                "at least one database endpoint is required".into(),
            ));
        }
        Ok(Self {
            binary: binary.into(),
            endpoints,
            warehouses,
            duration: duration.into(),
        })
    }

    fn first_endpoint(&self) -> &str {
        // Non-empty by construction.
        self.endpoints.first().map(String::as_str).unwrap_or_default()
    }

    pub(crate) fn tune_commands(&self) -> Vec<CommandLine> {
        CAPACITY_SETTINGS
            .iter()
            .map(|stmt| {
                CommandLine::new(self.binary.as_str())
                    .arg("sql")
                    .arg(format!("--url={}", self.first_endpoint()))
                    .args(["-e", *stmt])
            })
            .collect()
    }

    pub(crate) fn load_command(&self) -> CommandLine {
        CommandLine::new(self.binary.as_str())
            .args(["workload", "fixtures", "import", "tpcc"])
            .arg(format!("--warehouses={}", self.warehouses))
            .arg(self.first_endpoint())
    }

    pub(crate) fn level_command(&self, level: u32) -> CommandLine {
        CommandLine::new(self.binary.as_str())
            .args(["workload", "run", "tpcc"])
            .arg(format!("--warehouses={}", self.warehouses))
            .arg(format!("--active-warehouses={level}"))
            .arg(format!("--duration={}", self.duration))
            .arg("--tolerate-errors")
            .args(self.endpoints.iter().cloned())
    }
}

#[async_trait]
impl Workload for CockroachWorkload {
    async fn tune(&self) -> ExecResult<()> {
        for cmd in self.tune_commands() {
            debug!(command = %cmd, "applying capacity setting");
            cmd.output().await?;
        }
        Ok(())
    }

    async fn load(&self) -> ExecResult<()> {
        info!(warehouses = self.warehouses, "loading tpcc fixtures");
        self.load_command().output().await.map(drop)
    }

    async fn run_level(&self, level: u32, report: &Path) -> ExecResult<()> {
        let file = File::create(report)?;
        self.level_command(level).output_to(file).await
    }
}
