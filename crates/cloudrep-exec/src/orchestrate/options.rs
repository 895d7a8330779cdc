use std::{path::PathBuf, time::Duration};

use cloudrep_model::{Benchmark, Bootstrap, NodeCount};
use time::UtcOffset;

/// Default interval between progress reports while waiting on a benchmark.
pub const DEFAULT_WAIT_POLL: Duration = Duration::from_secs(300);

/// Per-benchmark extra arguments given on the command line.
///
/// Unset entries fall back to the plan's `benchArgs`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BenchExtras {
    pub cpu: Option<String>,
    pub io: Option<String>,
    pub net: Option<String>,
    pub tpcc: Option<String>,
}

impl BenchExtras {
    pub fn get(&self, benchmark: Benchmark) -> Option<&str> {
        match benchmark {
            Benchmark::Cpu => self.cpu.as_deref(),
            Benchmark::Io => self.io.as_deref(),
            Benchmark::Net => self.net.as_deref(),
            Benchmark::Tpcc => self.tpcc.as_deref(),
        }
    }
}

/// What a single driver invocation should do.
#[derive(Debug, Clone)]
pub struct DriverOptions {
    /// Bootstrap steps to perform; each is independent of the others.
    pub bootstrap: Vec<Bootstrap>,
    /// Benchmarks in request order.
    pub benchmarks: Vec<Benchmark>,
    /// Re-attach to benchmarks started earlier instead of starting them.
    pub resume: bool,
    pub destroy: bool,
    /// Local database binary uploaded instead of the staged release.
    pub cockroach_binary: Option<PathBuf>,
    /// Driver binary uploaded to every node; runs the TPCC ramp there.
    pub driver_binary: Option<PathBuf>,
    /// Overrides the plan's node count.
    pub nodes: Option<NodeCount>,
    pub extra_args: BenchExtras,
    /// Parent of the timestamped result directories.
    pub log_dir: PathBuf,
    /// Prefix of the cluster name; empty uses the bare identity.
    pub user: String,
    /// Report progress this often while waiting; `None` blocks silently.
    pub wait_poll: Option<Duration>,
    /// Offset used for result directory timestamps.
    pub clock_offset: UtcOffset,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            bootstrap: Vec::new(),
            benchmarks: Vec::new(),
            resume: false,
            destroy: false,
            cockroach_binary: None,
            driver_binary: None,
            nodes: None,
            extra_args: BenchExtras::default(),
            log_dir: PathBuf::from("."),
            user: String::new(),
            wait_poll: Some(DEFAULT_WAIT_POLL),
            clock_offset: UtcOffset::UTC,
        }
    }
}

impl DriverOptions {
    pub fn wants(&self, step: Bootstrap) -> bool {
        self.bootstrap.contains(&step)
    }

    pub fn wants_any(&self, benchmarks: &[Benchmark]) -> bool {
        self.benchmarks.iter().any(|b| benchmarks.contains(b))
    }

    /// Benchmarks in request order with repeats dropped.
    pub fn unique_benchmarks(&self) -> Vec<Benchmark> {
        let mut out: Vec<Benchmark> = Vec::with_capacity(self.benchmarks.len());
        for b in &self.benchmarks {
            if !out.contains(b) {
                out.push(*b);
            }
        }
        out
    }
}
