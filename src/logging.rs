// src/logging.rs

//! Logging setup for the `filterdag` binary using `tracing` +
//! `tracing-subscriber`.
//!
//! Priority for determining the filter:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `FILTERDAG_LOG` environment variable, in `EnvFilter` syntax
//!    (e.g. `info` or `filterdag::engine=debug,info`)
//! 3. default to `info`
//!
//! Logs go to STDERR; stdout carries only the per-run verdicts.

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

/// Environment variable consulted when `--log-level` is absent.
pub const LOG_ENV: &str = "FILTERDAG_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

/// Initialise global logging subscriber.
///
/// Call once at startup; a second call fails.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = match cli_level {
        Some(lvl) => EnvFilter::new(level_directive(lvl)),
        None => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE)),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}

/// `EnvFilter` directive for a CLI level.
pub fn level_directive(lvl: LogLevel) -> &'static str {
    match lvl {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
