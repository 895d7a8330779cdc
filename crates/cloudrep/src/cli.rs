use std::{path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand};
use cloudrep_exec::BenchExtras;
use cloudrep_model::{Benchmark, Bootstrap, ModelResult};

/// Cloud report benchmark orchestration.
#[derive(Debug, Parser)]
#[command(name = "cloudrep", version)]
pub struct Cli {
    /// Log filter (e.g. `info`, `cloudrep_exec=debug,info`).
    #[arg(long, global = true, value_name = "FILTER")]
    pub log_level: Option<String>,

    /// Log output: text, json or journald.
    #[arg(long, global = true, value_name = "FORMAT")]
    pub log_format: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write one driver script per cloud and machine type.
    Generate(GenerateArgs),
    /// Run the driver for one target (invoked by generated scripts).
    Drive(DriveArgs),
    /// Run, or wait for, the adaptive TPC-C load ramp on a cluster node.
    Escalate(EscalateArgs),
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Report configuration (JSON).
    #[arg(long, value_name = "FILE")]
    pub config: PathBuf,

    /// Local scripts uploaded to every cluster.
    #[arg(long, default_value = "./scripts")]
    pub scripts_dir: PathBuf,

    /// Cluster lifetime.
    #[arg(short = 'l', long, default_value = "24h")]
    pub lifetime: String,

    /// Overrides `outputDir` from the config.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    #[arg(long, default_value_t = 4)]
    pub nodes: u32,
}

#[derive(Debug, Args)]
pub struct DriveArgs {
    /// Target plan file, `-` for stdin.
    #[arg(long, default_value = "-")]
    pub plan: String,

    /// Directory receiving fetched results.
    #[arg(long, default_value = ".")]
    pub log_dir: PathBuf,

    /// Bootstrap step: create, upload, setup or all. Repeatable.
    #[arg(short = 'b', value_name = "STEP")]
    pub bootstrap: Vec<String>,

    /// Benchmark: cpu, io, net, tpcc or all. Repeatable.
    #[arg(short = 'w', value_name = "BENCHMARK")]
    pub benchmarks: Vec<String>,

    /// Upload this cockroach binary instead of staging a release.
    #[arg(short = 'c', value_name = "BINARY")]
    pub cockroach: Option<PathBuf>,

    /// Driver binary uploaded to run the TPCC ramp; defaults to this executable.
    #[arg(short = 'e', value_name = "BINARY")]
    pub driver: Option<PathBuf>,

    /// Do not start benchmarks; wait for the ones already running.
    #[arg(short = 'r')]
    pub resume: bool,

    /// Destroy the cluster at the end.
    #[arg(short = 'd')]
    pub destroy: bool,

    /// Override the number of nodes.
    #[arg(short = 'n')]
    pub nodes: Option<u32>,

    /// Additional IO benchmark arguments.
    #[arg(short = 'I', allow_hyphen_values = true, value_name = "ARGS")]
    pub io_args: Option<String>,

    /// Additional network benchmark arguments.
    #[arg(short = 'N', allow_hyphen_values = true, value_name = "ARGS")]
    pub net_args: Option<String>,

    /// Additional CPU benchmark arguments.
    #[arg(short = 'C', allow_hyphen_values = true, value_name = "ARGS")]
    pub cpu_args: Option<String>,

    /// Additional TPC-C benchmark arguments.
    #[arg(short = 'T', allow_hyphen_values = true, value_name = "ARGS")]
    pub tpcc_args: Option<String>,

    /// Seconds between progress reports while waiting; 0 waits silently.
    #[arg(long, default_value_t = 300)]
    pub wait_poll: u64,

    /// Cluster management tool.
    #[arg(long, default_value = "roachprod")]
    pub roachprod: String,
}

impl DriveArgs {
    pub fn bootstrap_steps(&self) -> ModelResult<Vec<Bootstrap>> {
        let mut out = Vec::new();
        for raw in &self.bootstrap {
            out.extend(Bootstrap::parse_selection(raw)?);
        }
        Ok(out)
    }

    pub fn benchmark_list(&self) -> ModelResult<Vec<Benchmark>> {
        let mut out = Vec::new();
        for raw in &self.benchmarks {
            out.extend(Benchmark::parse_selection(raw)?);
        }
        Ok(out)
    }

    pub fn extras(&self) -> BenchExtras {
        BenchExtras {
            cpu: self.cpu_args.clone(),
            io: self.io_args.clone(),
            net: self.net_args.clone(),
            tpcc: self.tpcc_args.clone(),
        }
    }

    pub fn poll(&self) -> Option<Duration> {
        (self.wait_poll > 0).then(|| Duration::from_secs(self.wait_poll))
    }
}

#[derive(Debug, Args)]
pub struct EscalateArgs {
    /// Take over the run marker even if another run holds it.
    #[arg(short = 'f')]
    pub force: bool,

    /// Wait for the current run instead of starting one.
    #[arg(short = 'w')]
    pub wait: bool,

    /// Highest level (total warehouses loaded).
    #[arg(short = 'W', value_name = "LEVEL")]
    pub max: Option<u32>,

    /// First level; defaults to half the highest.
    #[arg(short = 'A', value_name = "LEVEL")]
    pub start: Option<u32>,

    /// Level step; defaults to a tenth of the range, 0 runs only the highest.
    #[arg(short = 'I', value_name = "STEP")]
    pub increment: Option<u32>,

    /// Skip the data load.
    #[arg(short = 's')]
    pub skip_load: bool,

    /// Run time of each level.
    #[arg(short = 'd', default_value = "10m")]
    pub duration: String,

    /// Reports and run record; defaults to `$HOME/tpcc-results`.
    #[arg(long)]
    pub results_dir: Option<PathBuf>,

    /// Run marker; defaults to `$HOME/tpcc-escalate.pid`.
    #[arg(long)]
    pub marker: Option<PathBuf>,

    #[arg(long, default_value = "./cockroach")]
    pub cockroach: String,

    /// Give up waiting after this many seconds (exit code 75).
    #[arg(long, value_name = "SECS")]
    pub wait_timeout: Option<u64>,

    /// Seconds between checks while waiting.
    #[arg(long, default_value_t = 10)]
    pub wait_poll: u64,

    /// Seconds a waiter tolerates a run that has not claimed its marker yet.
    #[arg(long, value_name = "SECS", default_value_t = 60)]
    pub start_grace: u64,

    /// Database connection URLs.
    #[arg(value_name = "PGURL", required_unless_present = "wait")]
    pub endpoints: Vec<String>,
}

impl EscalateArgs {
    pub fn start_level(&self, max: u32) -> u32 {
        self.start.unwrap_or((max / 2).max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn generated_script_arguments_parse() {
        let cli = parse(&[
            "cloudrep", "drive", "--log-dir", "/tmp/logs/m5-large", "--plan", "-", "-b", "all",
            "-w", "cpu", "-w", "tpcc", "-T", "-W 100", "-r",
        ]);
        let Command::Drive(args) = cli.command else {
            panic!("expected drive");
        };
        assert_eq!(args.bootstrap_steps().unwrap(), Bootstrap::ALL.to_vec());
        assert_eq!(
            args.benchmark_list().unwrap(),
            vec![Benchmark::Cpu, Benchmark::Tpcc]
        );
        assert_eq!(args.extras().tpcc.as_deref(), Some("-W 100"));
        assert!(args.resume);
        assert!(!args.destroy);
        assert_eq!(args.driver, None);
        assert_eq!(args.poll(), Some(Duration::from_secs(300)));
    }

    #[test]
    fn unknown_benchmark_is_reported() {
        let cli = parse(&["cloudrep", "drive", "-w", "gpu"]);
        let Command::Drive(args) = cli.command else {
            panic!("expected drive");
        };
        assert!(args.benchmark_list().unwrap_err().to_string().contains("gpu"));
    }

    #[test]
    fn escalate_flags() {
        let cli = parse(&[
            "cloudrep", "--log-level", "debug", "escalate", "-W", "3000", "-A", "2500", "-I", "250",
            "-s", "-d", "5m", "postgres://n1", "postgres://n2",
        ]);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        let Command::Escalate(args) = cli.command else {
            panic!("expected escalate");
        };
        assert_eq!(args.max, Some(3000));
        assert_eq!(args.start_level(3000), 2500);
        assert_eq!(args.increment, Some(250));
        assert!(args.skip_load);
        assert_eq!(args.duration, "5m");
        assert_eq!(args.endpoints.len(), 2);
    }

    #[test]
    fn wait_mode_needs_no_endpoints() {
        let cli = parse(&["cloudrep", "escalate", "-w", "--wait-timeout", "60"]);
        let Command::Escalate(args) = cli.command else {
            panic!("expected escalate");
        };
        assert!(args.wait);
        assert_eq!(args.wait_timeout, Some(60));
        assert_eq!(args.start_grace, 60);
        assert_eq!(args.start_level(1), 1);

        assert!(Cli::try_parse_from(["cloudrep", "escalate", "-W", "10"]).is_err());
    }
}
