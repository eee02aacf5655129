// src/logging.rs

//! Logging setup for `pancake` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `PANCAKE_LOG` environment variable, either a level ("debug") or a
//!    full filter directive ("pancake::watch=trace,warn")
//! 3. default to `warn`
//!
//! Logs are sent to STDERR so that stdout only carries progress lines and
//! command output.

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "PANCAKE_LOG";

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = match cli_level {
        Some(lvl) => EnvFilter::new(level_from_log_level(lvl).as_str()),
        None => match std::env::var(LOG_ENV) {
            Ok(directives) if !directives.trim().is_empty() => {
                EnvFilter::try_new(directives.trim())?
            }
            _ => EnvFilter::new(tracing::Level::WARN.as_str()),
        },
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err))?;

    Ok(())
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}
