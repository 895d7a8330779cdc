//! Execution-time orchestration of one target: bootstrap the cluster, start the
//! requested benchmarks in detached sessions, then wait for and fetch each one.
pub mod layout;
mod options;
mod phase;

pub use options::{BenchExtras, DEFAULT_WAIT_POLL, DriverOptions};
pub use phase::Phase;

use std::{path::PathBuf, sync::Arc};

use cloudrep_model::{Benchmark, Bootstrap, NodeCount, TargetPlan};
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    cluster::{ClusterOps, CreateSpec, NodeSelector},
    error::{ExecError, ExecResult},
    task::{TaskHandle, WaitOutcome},
};

/// Drives one target's cluster through its phases.
///
/// Remote failures abort the run immediately; nothing is retried. Bootstrap
/// steps are gated individually so an operator can re-run only what is left.
pub struct Driver {
    ops: Arc<dyn ClusterOps>,
    plan: TargetPlan,
    opts: DriverOptions,
    cluster: String,
    nodes: NodeCount,
    benchmarks: Vec<Benchmark>,
    phase: Phase,
}

impl Driver {
    pub fn new(ops: Arc<dyn ClusterOps>, plan: TargetPlan, opts: DriverOptions) -> ExecResult<Self> {
        let nodes = opts.nodes.unwrap_or(plan.nodes);
        if nodes == 0 {
            return Err(ExecError::InvalidSpec("cluster needs at least one node".into()));
        }
        if nodes < 2 && opts.wants_any(&[Benchmark::Net, Benchmark::Tpcc]) {
            return Err(ExecError::InvalidSpec(format!(
                "net and tpcc benchmarks need at least 2 nodes, got {nodes}"
            )));
        }

        let cluster = plan.cluster_for_user(&opts.user);
        let benchmarks = opts.unique_benchmarks();
        Ok(Self {
            ops,
            plan,
            opts,
            cluster,
            nodes,
            benchmarks,
            phase: Phase::Idle,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    fn enter(&mut self, next: Phase) {
        info!(cluster = %self.cluster, from = %self.phase, phase = %next, "phase transition");
        self.phase = next;
    }

    /// Run every requested phase in order and return the fetched result directories.
    pub async fn run(&mut self, cancel: &CancellationToken) -> ExecResult<Vec<PathBuf>> {
        if self.opts.wants(Bootstrap::Create) {
            check(cancel)?;
            self.enter(Phase::Creating);
            self.create_cluster().await?;
        }
        if self.opts.wants(Bootstrap::Upload) {
            check(cancel)?;
            self.enter(Phase::Uploading);
            self.upload_scripts().await?;
        }
        if self.opts.wants(Bootstrap::Setup) {
            check(cancel)?;
            self.enter(Phase::SettingUp);
            self.setup_cluster().await?;
        }

        let handles = if self.opts.resume {
            info!(cluster = %self.cluster, "resuming; benchmarks are not restarted");
            self.benchmarks
                .iter()
                .map(|b| TaskHandle::attach(*b, self.host(*b)))
                .collect()
        } else {
            check(cancel)?;
            self.enter(Phase::Running);
            let mut handles = Vec::with_capacity(self.benchmarks.len());
            for b in self.benchmarks.clone() {
                handles.push(self.start_benchmark(b).await?);
            }
            handles
        };

        check(cancel)?;
        self.enter(Phase::Waiting);
        let mut fetched = Vec::with_capacity(handles.len());
        for handle in &handles {
            self.await_completion(handle, cancel).await?;
            fetched.push(self.fetch_results(handle).await?);
        }

        if self.opts.destroy {
            check(cancel)?;
            self.enter(Phase::Destroying);
            self.ops.destroy(&self.cluster).await?;
        }

        self.enter(Phase::Terminal);
        Ok(fetched)
    }

    fn host(&self, benchmark: Benchmark) -> NodeSelector {
        layout::host(benchmark, &self.cluster, self.nodes)
    }

    fn all_nodes(&self) -> NodeSelector {
        NodeSelector::all(self.cluster.as_str())
    }

    async fn create_cluster(&self) -> ExecResult<()> {
        let spec = CreateSpec {
            nodes: self.nodes,
            lifetime: self.plan.lifetime.clone(),
            cloud: self.plan.cloud.clone(),
            machine_type: self.plan.machine_type.clone(),
            deploy_args: self.plan.deploy_args.clone(),
        };
        self.ops.create(&self.cluster, &spec).await?;
        self.ops
            .run(
                &self.all_nodes(),
                &argv(&["tmux", "new", "-s", layout::TMUX_SESSION, "-d"]),
            )
            .await
            .map(drop)
    }

    async fn upload_scripts(&self) -> ExecResult<()> {
        let all = self.all_nodes();
        self.ops.run(&all, &argv(&["rm", "-rf", "./scripts"])).await?;
        self.ops.put(&all, &self.plan.scripts_dir, "scripts").await?;
        self.ops
            .run(&all, &argv(&["chmod", "-R", "+x", "./scripts"]))
            .await?;
        self.ops.run(&all, &argv(&["rm", "-f", "./cockroach"])).await?;

        match &self.opts.cockroach_binary {
            Some(binary) => {
                debug!(binary = %binary.display(), "uploading local cockroach binary");
                self.ops.put(&all, binary, "cockroach").await?;
            }
            None => self.ops.stage(&self.cluster, "cockroach").await?,
        }

        let Some(driver) = &self.opts.driver_binary else {
            debug!("no driver binary configured; tpcc needs one on the cluster");
            return Ok(());
        };
        let remote = format!("./{}", Benchmark::DRIVER_BINARY);
        self.ops.run(&all, &argv(&["rm", "-f", &remote])).await?;
        self.ops.put(&all, driver, Benchmark::DRIVER_BINARY).await?;
        self.ops
            .run(&all, &argv(&["chmod", "+x", &remote]))
            .await
            .map(drop)
    }

    async fn setup_cluster(&self) -> ExecResult<()> {
        self.ops
            .run(
                &self.all_nodes(),
                &argv(&["sudo", "./scripts/gen/setup.sh", &self.plan.cloud]),
            )
            .await
            .map(drop)
    }

    fn extra_args(&self, benchmark: Benchmark) -> &str {
        self.opts
            .extra_args
            .get(benchmark)
            .unwrap_or_else(|| self.plan.bench_extra(benchmark.name()))
    }

    /// Launch a benchmark in its own detached window; does not wait for it.
    async fn start_benchmark(&self, benchmark: Benchmark) -> ExecResult<TaskHandle> {
        let host = self.host(benchmark);
        let extra = self.extra_args(benchmark);

        let command = match benchmark {
            Benchmark::Cpu | Benchmark::Io => layout::runner_command(benchmark, &[extra]),
            Benchmark::Net => {
                let server = NodeSelector::node(self.cluster.as_str(), self.nodes);
                let ip = self.ops.ip(&server).await?;
                let port = layout::NET_PORT.to_string();
                self.ops
                    .run(&server, &argv(&[benchmark.runner(), "-S", "-p", &port]))
                    .await?;
                layout::runner_command(benchmark, &["-s", &ip, "-p", &port, extra])
            }
            Benchmark::Tpcc => {
                // A record left by an earlier ramp must not satisfy this run's wait.
                self.ops.run(&host, &layout::stale_record_cleanup()).await?;
                let urls = self.start_cockroach().await?;
                let quoted: Vec<String> = urls.iter().map(|u| layout::shell_quote(u)).collect();
                layout::runner_command(benchmark, &[extra, &quoted.join(" ")])
            }
        };

        self.ops
            .run(&host, &layout::tmux_window(benchmark.name(), &command))
            .await?;
        info!(cluster = %self.cluster, benchmark = %benchmark, node = %host, "benchmark started");
        Ok(TaskHandle::attach(benchmark, host))
    }

    /// Start the database on every node but the last and return its URLs.
    async fn start_cockroach(&self) -> ExecResult<Vec<String>> {
        let probe = self
            .ops
            .run(
                &NodeSelector::node(self.cluster.as_str(), 1),
                &argv(&[layout::EXTRA_STORES_PROBE]),
            )
            .await?;
        let db = layout::database_nodes(&self.cluster, self.nodes);
        self.ops.start(&db, &layout::cockroach_start_args(&probe)).await?;

        let urls = self.ops.pgurl(&db).await?;
        if urls.is_empty() {
            return Err(ExecError::InvalidSpec(format!("no connection urls for {db}")));
        }
        Ok(urls)
    }

    async fn await_completion(
        &self,
        handle: &TaskHandle,
        cancel: &CancellationToken,
    ) -> ExecResult<()> {
        loop {
            let outcome = tokio::select! {
                res = handle.wait(self.ops.as_ref(), self.opts.wait_poll) => res?,
                _ = cancel.cancelled() => return Err(ExecError::Canceled),
            };
            match outcome {
                WaitOutcome::Completed => {
                    info!(cluster = %self.cluster, benchmark = %handle.benchmark(), "benchmark finished");
                    return Ok(());
                }
                WaitOutcome::StillRunning => {
                    debug!(benchmark = %handle.benchmark(), node = %handle.node(), "benchmark still running");
                }
                WaitOutcome::ProcessGone => {
                    warn!(cluster = %self.cluster, benchmark = %handle.benchmark(), "benchmark process is gone");
                    return Err(ExecError::ProcessGone {
                        benchmark: handle.benchmark().to_string(),
                    });
                }
            }
        }
    }

    async fn fetch_results(&self, handle: &TaskHandle) -> ExecResult<PathBuf> {
        let benchmark = handle.benchmark();
        let now = OffsetDateTime::now_utc().to_offset(self.opts.clock_offset);
        let local = self
            .opts
            .log_dir
            .join(layout::results_dir_name(benchmark, now));
        let remote = format!("./{}", benchmark.results_name());

        self.ops.get(handle.node(), &remote, &local).await?;
        info!(benchmark = %benchmark, path = %local.display(), "results fetched");
        Ok(local)
    }
}

fn check(cancel: &CancellationToken) -> ExecResult<()> {
    if cancel.is_cancelled() {
        return Err(ExecError::Canceled);
    }
    Ok(())
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}
