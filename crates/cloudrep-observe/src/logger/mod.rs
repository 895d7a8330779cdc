mod config;
mod error;
mod install;
mod object;

pub use config::{ENV_LOG_FORMAT, ENV_LOG_LEVEL, LoggerConfig};
pub use error::{LoggerError, LoggerResult};
pub use object::{LoggerFormat, LoggerLevel, LoggerTimeZone, init_local_offset};

/// Install the global tracing subscriber described by `cfg`.
///
/// Must be called once per process. With `LoggerTimeZone::Local`, call
/// [`init_local_offset`] first, before any runtime threads exist.
///
/// ```rust
/// use cloudrep_observe::{LoggerConfig, init_logger};
///
/// let cfg = LoggerConfig::default();
/// init_logger(&cfg).expect("logger installed");
/// tracing::info!("ready");
/// ```
pub fn init_logger(cfg: &LoggerConfig) -> LoggerResult<()> {
    match cfg.format {
        LoggerFormat::Text => install::text(cfg),
        LoggerFormat::Json => install::json(cfg),
        LoggerFormat::Journald => install::journald(cfg),
    }
}
