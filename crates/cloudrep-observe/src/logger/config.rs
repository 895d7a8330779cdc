use serde::{Deserialize, Serialize};
use std::io::IsTerminal;

use crate::logger::{
    error::LoggerResult,
    object::{LoggerFormat, LoggerLevel, LoggerTimeZone},
};

/// Environment variable overriding the level filter.
pub const ENV_LOG_LEVEL: &str = "CLOUDREP_LOG";

/// Environment variable overriding the output format.
pub const ENV_LOG_FORMAT: &str = "CLOUDREP_LOG_FORMAT";

/// Logger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// Filter expression (e.g. `"info"`, `"cloudrep_exec=debug,info"`).
    pub level: LoggerLevel,
    pub tz: LoggerTimeZone,
    /// Include module targets in each line.
    pub with_targets: bool,
    /// ANSI colors for text output; ignored when stderr is not a terminal.
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LoggerFormat::default(),
            level: LoggerLevel::default(),
            tz: LoggerTimeZone::default(),
            with_targets: false,
            use_color: true,
        }
    }
}

impl LoggerConfig {
    /// Apply [`ENV_LOG_LEVEL`] / [`ENV_LOG_FORMAT`] from the process environment.
    pub fn with_env_overrides(self) -> LoggerResult<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides using an arbitrary variable lookup.
    ///
    /// Unset or blank variables leave the current value untouched.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> LoggerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|v| !v.trim().is_empty()) {
            self.level = level.parse()?;
        }
        if let Some(format) = lookup(ENV_LOG_FORMAT).filter(|v| !v.trim().is_empty()) {
            self.format = format.parse()?;
        }
        Ok(self)
    }

    /// Colors only when enabled and the log stream (stderr) is a terminal.
    ///
    /// Generated scripts tee their output into a file, so this is evaluated at
    /// install time rather than at config parse time.
    pub fn should_use_color(&self) -> bool {
        self.use_color && std::io::stderr().is_terminal()
    }
}
