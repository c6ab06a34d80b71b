// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::demo::demo_config;
use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{FanoutError, Result};

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        FanoutError::ConfigError(format!("reading config file {}: {}", path.display(), e))
    })?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
///
/// Relative working directories in the file are resolved against the
/// directory containing it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    ConfigFile::from_raw(raw_config, config_root_dir(path.as_ref()))
}

/// Pick the configuration for this run.
///
/// - An explicit `--config` path must load.
/// - Otherwise `Fanout.toml` in the working directory is used if present.
/// - Otherwise the built-in publisher/subscriber demo topology.
pub fn resolve_config(explicit: Option<&Path>) -> Result<ConfigFile> {
    if let Some(path) = explicit {
        return load_and_validate(path);
    }

    let default_path = default_config_path();
    if default_path.is_file() {
        return load_and_validate(&default_path);
    }

    info!(
        "no {} found; using the built-in publisher/subscriber demo",
        default_path.display()
    );
    demo_config()
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("Fanout.toml")
}

/// Directory a config path's relative references are resolved against.
///
/// A bare filename (parent = "") falls back to the current directory.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
