// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Upper bound for `--grace-period`: one day.
pub const MAX_GRACE_PERIOD_SECS: u64 = 86_400;

/// Command-line arguments for `fanout`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "fanout",
    version,
    about = "Launch a fan-out of worker processes, wait, then tear them all down.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Fanout.toml` in the current working directory, or the
    /// built-in publisher/subscriber demo if that file does not exist.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Number of instances to launch per role (overrides the config).
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub count: Option<u32>,

    /// Tear everything down after this many seconds instead of waiting for
    /// Enter.
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Seconds to wait after the graceful stop before force-killing
    /// (1 to 86400).
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..=MAX_GRACE_PERIOD_SECS))]
    pub grace_period: Option<u64>,

    /// Keep going when a dependency service cannot be started.
    ///
    /// Processes depending on the missing service are marked failed instead
    /// of being launched; the run exits with code 3.
    #[arg(long)]
    pub allow_missing_services: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `FANOUT_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the expanded process list, but don't start
    /// anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
