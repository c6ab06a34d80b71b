// src/logging.rs

//! Structured logging via `tracing` + `tracing-subscriber`.
//!
//! The filter comes from, in order:
//! 1. the `--log-level` flag, applied to every target
//! 2. `FANOUT_LOG`, in `EnvFilter` directive syntax (`debug`,
//!    `fanout::supervisor=trace,info`)
//! 3. `info`
//!
//! Everything goes to stderr; stdout is reserved for the final summary and
//! for child output in `inherit` mode.

use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;
use crate::errors::{FanoutError, Result, SupervisorInitFailure};

const LOG_ENV_VAR: &str = "FANOUT_LOG";
const DEFAULT_DIRECTIVE: &str = "info";

/// Install the global subscriber. Returns `Fatal` if one is already set or
/// `FANOUT_LOG` holds directives that do not parse.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env_value = std::env::var(LOG_ENV_VAR).ok();
    let filter = build_filter(cli_level, env_value.as_deref())?;

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| SupervisorInitFailure::Logging(e.to_string()))?;

    Ok(())
}

fn build_filter(cli_level: Option<LogLevel>, env_value: Option<&str>) -> Result<EnvFilter> {
    if let Some(level) = cli_level {
        return Ok(EnvFilter::new(directive_for(level)));
    }

    match env_value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives).map_err(|e| {
            FanoutError::from(SupervisorInitFailure::Logging(format!(
                "invalid {LOG_ENV_VAR} value '{directives}': {e}"
            )))
        }),
        None => Ok(EnvFilter::new(DEFAULT_DIRECTIVE)),
    }
}

fn directive_for(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
