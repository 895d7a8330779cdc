use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Benchmark kinds the orchestration driver knows how to start, wait for and fetch.
///
/// Each kind maps to a remote runner with a fixed contract: `<runner> [extra args]`
/// starts it, `<runner> -w` blocks until it finishes, and results are left in
/// [`Benchmark::results_name`] in the remote home directory. TPCC is run by the
/// uploaded `cloudrep` binary itself (its `escalate` subcommand).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Benchmark {
    Cpu,
    Io,
    Net,
    /// Primary transactional workload (adaptive load ramp).
    Tpcc,
}

impl Benchmark {
    /// Every benchmark, in the order `all` expands to.
    pub const ALL: [Benchmark; 4] = [
        Benchmark::Cpu,
        Benchmark::Io,
        Benchmark::Net,
        Benchmark::Tpcc,
    ];

    /// Returns the kind as a static string.
    pub fn name(&self) -> &'static str {
        match self {
            Benchmark::Cpu => "cpu",
            Benchmark::Io => "io",
            Benchmark::Net => "net",
            Benchmark::Tpcc => "tpcc",
        }
    }

    /// Remote binary name of the driver, uploaded next to the database binary.
    pub const DRIVER_BINARY: &'static str = "cloudrep";

    /// Runner command relative to the remote home directory.
    pub fn runner(&self) -> &'static str {
        match self {
            Benchmark::Cpu => "./scripts/gen/cpu.sh",
            Benchmark::Io => "./scripts/gen/fio.sh",
            Benchmark::Net => "./scripts/gen/network-netperf.sh",
            Benchmark::Tpcc => "./cloudrep escalate",
        }
    }

    /// Directory the runner leaves its artifacts in (remote, relative to home).
    pub fn results_name(&self) -> &'static str {
        match self {
            Benchmark::Cpu => "coremark-results",
            Benchmark::Io => "fio-results",
            Benchmark::Net => "netperf-results",
            Benchmark::Tpcc => "tpcc-results",
        }
    }

    /// Parse a `-w` value, expanding `all`.
    pub fn parse_selection(s: &str) -> ModelResult<Vec<Benchmark>> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::ALL.to_vec());
        }
        Ok(vec![s.parse()?])
    }
}

impl FromStr for Benchmark {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(Benchmark::Cpu),
            "io" => Ok(Benchmark::Io),
            "net" => Ok(Benchmark::Net),
            "tpcc" => Ok(Benchmark::Tpcc),
            _ => Err(ModelError::UnknownBenchmark(s.to_string())),
        }
    }
}

impl fmt::Display for Benchmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
