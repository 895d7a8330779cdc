use std::{
    env, fs, io,
    path::PathBuf,
    process::ExitCode,
    sync::Arc,
    time::Duration,
};

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use cloudrep_core::{GenerateOptions, Generator};
use cloudrep_exec::{
    ClusterOps, CockroachWorkload, Driver, DriverOptions, EscalateOptions, EscalationController,
    Roachprod, wait_for_run,
};
use cloudrep_model::{PassRule, Ramp, RunStatus, TargetPlan};
use cloudrep_observe::LoggerTimeZone;

use crate::cli::{DriveArgs, EscalateArgs, GenerateArgs};

const DEFAULT_RESULTS_DIR: &str = "tpcc-results";
const DEFAULT_MARKER: &str = "tpcc-escalate.pid";

pub fn generate(args: GenerateArgs) -> anyhow::Result<ExitCode> {
    let options = GenerateOptions {
        scripts_dir: args.scripts_dir,
        lifetime: args.lifetime,
        nodes: args.nodes,
        output_dir: args.output_dir,
        ..Default::default()
    };
    let generator = Generator::from_file(&args.config, options)
        .with_context(|| format!("loading {}", args.config.display()))?;

    let written = generator.generate_all()?;
    for path in &written {
        println!("{}", path.display());
    }
    Ok(ExitCode::SUCCESS)
}

pub async fn drive(args: DriveArgs) -> anyhow::Result<ExitCode> {
    let raw = if args.plan == "-" {
        io::read_to_string(io::stdin()).context("reading target plan from stdin")?
    } else {
        fs::read_to_string(&args.plan).with_context(|| format!("reading {}", args.plan))?
    };
    let plan: TargetPlan = serde_json::from_str(&raw).context("malformed target plan")?;

    let opts = DriverOptions {
        bootstrap: args.bootstrap_steps()?,
        benchmarks: args.benchmark_list()?,
        resume: args.resume,
        destroy: args.destroy,
        cockroach_binary: args.cockroach.clone(),
        driver_binary: driver_binary(&args),
        nodes: args.nodes,
        extra_args: args.extras(),
        log_dir: args.log_dir.clone(),
        user: env::var("USER").unwrap_or_default(),
        wait_poll: args.poll(),
        clock_offset: LoggerTimeZone::Local.offset(),
    };

    let ops: Arc<dyn ClusterOps> = Arc::new(Roachprod::new(args.roachprod.as_str()));
    let mut driver = Driver::new(ops, plan, opts)?;
    info!(cluster = %driver.cluster(), "driver starting");

    let cancel = CancellationToken::new();
    watch_signals(cancel.clone());

    let fetched = driver
        .run(&cancel)
        .await
        .with_context(|| format!("driver stopped in phase {}", driver.phase()))?;
    for path in fetched {
        info!(path = %path.display(), "results available");
    }
    Ok(ExitCode::SUCCESS)
}

pub async fn escalate(args: EscalateArgs) -> anyhow::Result<ExitCode> {
    let home = env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let results_dir = args
        .results_dir
        .clone()
        .unwrap_or_else(|| home.join(DEFAULT_RESULTS_DIR));
    let marker = args.marker.clone().unwrap_or_else(|| home.join(DEFAULT_MARKER));

    if args.wait {
        let outcome = wait_for_run(
            &results_dir,
            &marker,
            args.wait_timeout.map(Duration::from_secs),
            Duration::from_secs(args.wait_poll.max(1)),
            Duration::from_secs(args.start_grace),
        )
        .await?;
        info!(outcome = %outcome, results = %results_dir.display(), "wait finished");
        return Ok(ExitCode::from(outcome.exit_code()));
    }

    let max = args.max.context("-W (highest level) is required")?;
    let ramp = Ramp::new(args.start_level(max), max, args.increment);
    let workload = CockroachWorkload::new(args.cockroach, args.endpoints, max, args.duration)?;
    let controller = EscalationController::new(
        Arc::new(workload),
        EscalateOptions {
            ramp,
            rule: PassRule::default(),
            skip_load: args.skip_load,
            force: args.force,
            results_dir,
            marker,
        },
    )?;

    let cancel = CancellationToken::new();
    watch_signals(cancel.clone());

    let record = controller.run(&cancel).await?;
    Ok(match record.status {
        RunStatus::Succeeded => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

/// Binary shipped to the cluster for the TPCC ramp: `-e`, else this executable.
fn driver_binary(args: &DriveArgs) -> Option<PathBuf> {
    if let Some(path) = &args.driver {
        return Some(path.clone());
    }
    match env::current_exe() {
        Ok(path) => Some(path),
        Err(e) => {
            warn!(error = %e, "cannot locate the running executable; it will not be uploaded");
            None
        }
    }
}

/// Cancel `token` on SIGINT or SIGTERM.
fn watch_signals(token: CancellationToken) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            let mut term = match signal(SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    warn!(error = %e, "SIGTERM handler unavailable");
                    return;
                }
            };
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
        }
        warn!("signal received; stopping at the next boundary");
        token.cancel();
    });
}
