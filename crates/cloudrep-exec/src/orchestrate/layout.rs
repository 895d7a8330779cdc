//! Where each benchmark runs on the cluster and how its commands look.
use cloudrep_model::{Benchmark, NodeCount};
use time::OffsetDateTime;

use crate::{cluster::NodeSelector, escalate::RUN_RECORD_FILE};

/// Detached terminal session hosting every benchmark window.
pub const TMUX_SESSION: &str = "cloud-report";

/// Port of the network benchmark server.
pub const NET_PORT: u16 = 1337;

/// Database flags added to the discovered `--store` flags.
pub const COCKROACH_START_FLAGS: &str = "--cache=0.25 --max-sql-memory=0.4";

/// Lists data disks beyond the first, which the cluster tool already uses.
pub const EXTRA_STORES_PROBE: &str = "ls -1d /mnt/data[2-9]* 2>/dev/null || echo";

/// Node that hosts the benchmark task (and is waited on / fetched from).
///
/// CPU and IO run on node 1; the network client on the second to last node,
/// talking to a server on the last; TPCC drives the database from the last node.
pub fn host(benchmark: Benchmark, cluster: &str, nodes: NodeCount) -> NodeSelector {
    match benchmark {
        Benchmark::Cpu | Benchmark::Io => NodeSelector::node(cluster, 1),
        Benchmark::Net => NodeSelector::node(cluster, nodes - 1),
        Benchmark::Tpcc => NodeSelector::node(cluster, nodes),
    }
}

/// Nodes running the database for TPCC: every node but the last.
pub fn database_nodes(cluster: &str, nodes: NodeCount) -> NodeSelector {
    NodeSelector::range(cluster, 1, nodes - 1)
}

/// `start` arguments: one `--store` per extra disk plus fixed memory flags.
pub fn cockroach_start_args(probe_output: &str) -> String {
    let mut parts: Vec<String> = probe_output
        .split_whitespace()
        .map(|disk| format!("--store {disk}/cockroach"))
        .collect();
    parts.push(COCKROACH_START_FLAGS.to_string());
    parts.join(" ")
}

/// Runner invocation with optional extra arguments.
pub fn runner_command(benchmark: Benchmark, args: &[&str]) -> String {
    let mut cmd = benchmark.runner().to_string();
    for arg in args.iter().map(|a| a.trim()).filter(|a| !a.is_empty()) {
        cmd.push(' ');
        cmd.push_str(arg);
    }
    cmd
}

/// Remote command removing the TPCC run record of a previous run.
pub fn stale_record_cleanup() -> Vec<String> {
    vec![
        "rm".to_string(),
        "-f".to_string(),
        format!("./{}/{RUN_RECORD_FILE}", Benchmark::Tpcc.results_name()),
    ]
}

/// Remote command opening a detached window named `name` that runs `command`.
pub fn tmux_window(name: &str, command: &str) -> Vec<String> {
    ["tmux", "neww", "-t", TMUX_SESSION, "-n", name, "-d", "--"]
        .into_iter()
        .map(String::from)
        .chain(std::iter::once(shell_quote(command)))
        .collect()
}

/// Quote `s` as a single POSIX shell word.
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Local directory receiving one benchmark's artifacts: `<results>.<YYYYMMDD.HH:MM:SS>`.
pub fn results_dir_name(benchmark: Benchmark, at: OffsetDateTime) -> String {
    format!(
        "{}.{:04}{:02}{:02}.{:02}:{:02}:{:02}",
        benchmark.results_name(),
        at.year(),
        u8::from(at.month()),
        at.day(),
        at.hour(),
        at.minute(),
        at.second()
    )
}

#[cfg(test)]
mod tests {
    use time::{Date, Month, Time};

    use super::*;

    #[test]
    fn hosts_follow_cluster_size() {
        assert_eq!(host(Benchmark::Cpu, "c", 4).to_string(), "c:1");
        assert_eq!(host(Benchmark::Io, "c", 6).to_string(), "c:1");
        assert_eq!(host(Benchmark::Net, "c", 4).to_string(), "c:3");
        assert_eq!(host(Benchmark::Tpcc, "c", 6).to_string(), "c:6");
        assert_eq!(database_nodes("c", 4).to_string(), "c:1-3");
    }

    #[test]
    fn store_flags_from_probe() {
        assert_eq!(
            cockroach_start_args("/mnt/data2\n/mnt/data3\n"),
            "--store /mnt/data2/cockroach --store /mnt/data3/cockroach --cache=0.25 --max-sql-memory=0.4"
        );
        assert_eq!(cockroach_start_args("\n"), COCKROACH_START_FLAGS);
    }

    #[test]
    fn runner_command_skips_blank_extras() {
        assert_eq!(runner_command(Benchmark::Cpu, &[""]), "./scripts/gen/cpu.sh");
        assert_eq!(
            runner_command(Benchmark::Io, &[" -d 60 ", ""]),
            "./scripts/gen/fio.sh -d 60"
        );
    }

    #[test]
    fn window_command_is_one_quoted_word() {
        let argv = tmux_window("tpcc", "./cloudrep escalate 'postgres://a?b=1'");
        assert_eq!(argv[..8], ["tmux", "neww", "-t", "cloud-report", "-n", "tpcc", "-d", "--"]);
        assert_eq!(argv[8], r"'./cloudrep escalate '\''postgres://a?b=1'\'''");
    }

    #[test]
    fn cleanup_targets_the_fetched_record() {
        assert_eq!(stale_record_cleanup(), ["rm", "-f", "./tpcc-results/run.json"]);
    }

    #[test]
    fn results_dir_is_timestamped() {
        let at = Date::from_calendar_date(2026, Month::March, 7)
            .unwrap()
            .with_time(Time::from_hms(9, 5, 30).unwrap())
            .assume_utc();
        assert_eq!(
            results_dir_name(Benchmark::Net, at),
            "netperf-results.20260307.09:05:30"
        );
    }
}
