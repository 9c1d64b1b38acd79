//! Logger configuration and installation of the global `tracing` subscriber.
mod config;
mod error;
mod install;
mod object;

#[cfg(feature = "timezone-sync")]
mod sync;

pub use config::{ENV_LOG_FORMAT, ENV_LOG_LEVEL, ENV_LOG_TZ, LoggerConfig};
pub use error::{LoggerError, LoggerResult};
pub use object::{LoggerFormat, LoggerLevel, LoggerTimeZone, LoggerTimestamp, init_local_offset};

#[cfg(feature = "timezone-sync")]
pub use sync::{TZ_SYNC_INTERVAL, TZ_SYNC_TASK_NAME, TZ_SYNC_TIMEOUT, timezone_sync};

/// Install the global subscriber described by `cfg`.
///
/// With [`LoggerTimeZone::Local`], call [`init_local_offset`] from `main`
/// before the async runtime starts any threads.
///
/// ```rust
/// use mctl_observe::{LoggerConfig, init_logger};
///
/// let config = LoggerConfig::default();
/// init_logger(&config).expect("failed to initialize logger");
/// tracing::info!("logger ready");
/// ```
pub fn init_logger(cfg: &LoggerConfig) -> LoggerResult<()> {
    match cfg.format {
        LoggerFormat::Text => install::text(cfg),
        LoggerFormat::Json => install::json(cfg),
        LoggerFormat::Journald => install::journald(cfg),
    }
}
