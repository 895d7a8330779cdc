mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use cloudrep_observe::{LoggerConfig, LoggerTimeZone, init_local_offset, init_logger};

use crate::cli::{Cli, Command};

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // 1) local offset, while the process is still single-threaded
    init_local_offset();

    // 2) logger
    let mut cfg = LoggerConfig {
        tz: LoggerTimeZone::Local,
        ..Default::default()
    };
    if let Some(level) = &cli.log_level {
        cfg.level = level.parse()?;
    }
    if let Some(format) = &cli.log_format {
        cfg.format = format.parse()?;
    }
    init_logger(&cfg.with_env_overrides()?)?;
    debug!(command = ?cli.command, "logger initialized");

    // 3) runtime
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        match cli.command {
            Command::Generate(args) => commands::generate(args),
            Command::Drive(args) => commands::drive(args).await,
            Command::Escalate(args) => commands::escalate(args).await,
        }
    })
}
