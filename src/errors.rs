// src/errors.rs

//! Crate-wide error type and the mapping onto CLI exit codes.

use thiserror::Error;

/// Reasons the supervisor cannot start at all.
///
/// Any of these aborts the run before a single process is spawned.
#[derive(Error, Debug)]
pub enum SupervisorInitFailure {
    #[error("insufficient privileges (config requires elevated rights)")]
    MissingPrivileges,

    #[error("process creation unavailable: {0}")]
    NoProcessBackend(String),

    #[error("logging could not be initialised: {0}")]
    Logging(String),
}

#[derive(Error, Debug)]
pub enum FanoutError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("dependency service '{service}' unavailable: {reason}")]
    DependencyUnavailable { service: String, reason: String },

    #[error("failed to launch '{label}': {reason}")]
    LaunchFailure { label: String, reason: String },

    #[error("failed to stop '{label}': {reason}")]
    TeardownFailure { label: String, reason: String },

    #[error("supervisor init failure: {0}")]
    Fatal(#[from] SupervisorInitFailure),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FanoutError {
    /// Process exit code reported by the CLI for this error.
    ///
    /// Everything that prevents the supervisor from starting (bad config,
    /// missing privileges, no process backend) counts as an init failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            FanoutError::DependencyUnavailable { .. } => 1,
            FanoutError::LaunchFailure { .. } | FanoutError::TeardownFailure { .. } => 3,
            FanoutError::ConfigError(_)
            | FanoutError::IoError(_)
            | FanoutError::TomlError(_)
            | FanoutError::Fatal(_)
            | FanoutError::Other(_) => 2,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, FanoutError>;
