// src/config/mod.rs

//! Configuration loading and validation for fanout.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk, or fall back to the demo (`loader.rs`,
//!   `demo.rs`).
//! - Validate labels, counts and service references (`validate.rs`).
//! - Expand roles into launchable process specs (`expand.rs`).

pub mod demo;
pub mod duration;
pub mod expand;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{load_and_validate, load_from_path, resolve_config};
pub use model::{ConfigFile, ConfigSection, RawConfigFile, RoleConfig, ServiceConfig};
pub use validate::validate_raw_config;
