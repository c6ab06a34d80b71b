// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::OutputMode;

/// Configuration exactly as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// grace_period = "3s"
/// timeout = "30s"
///
/// [service.mosquitto]
/// status = ["systemctl", "is-active", "--quiet", "mosquitto"]
/// start = ["systemctl", "start", "mosquitto"]
///
/// [[role]]
/// label = "publisher"
/// command = "python"
/// args = ["group_5_publisher.py"]
/// count = 3
/// depends_on_service = "mosquitto"
/// ```
///
/// All sections except `[[role]]` are optional.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// Externally managed services, keyed by service name.
    #[serde(default)]
    pub service: BTreeMap<String, ServiceConfig>,

    /// Worker roles in launch order.
    #[serde(default)]
    pub role: Vec<RoleConfig>,
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (or the loader), so
/// every role references a declared service and every label is well formed.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub service: BTreeMap<String, ServiceConfig>,
    pub role: Vec<RoleConfig>,

    /// Directory relative `working_dir`s are resolved against.
    pub base_dir: PathBuf,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile, base_dir: PathBuf) -> Self {
        Self {
            config: raw.config,
            service: raw.service,
            role: raw.role,
            base_dir,
        }
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// How long processes get to exit after the graceful stop.
    #[serde(
        default = "default_grace_period",
        deserialize_with = "super::duration::deserialize"
    )]
    pub grace_period: Duration,

    /// Automatic teardown after this long; `None` waits for Enter / Ctrl-C.
    #[serde(default, deserialize_with = "super::duration::deserialize_opt")]
    pub timeout: Option<Duration>,

    /// Liveness polling interval while waiting.
    #[serde(
        default = "default_poll_interval",
        deserialize_with = "super::duration::deserialize"
    )]
    pub poll_interval: Duration,

    #[serde(default)]
    pub output: OutputMode,

    /// Refuse to start unless running with elevated rights.
    #[serde(default)]
    pub require_privileges: bool,

    /// Abort the whole run when a dependency service is unavailable.
    #[serde(default = "default_strict_dependencies")]
    pub strict_dependencies: bool,
}

fn default_grace_period() -> Duration {
    Duration::from_secs(3)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_strict_dependencies() -> bool {
    true
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            grace_period: default_grace_period(),
            timeout: None,
            poll_interval: default_poll_interval(),
            output: OutputMode::default(),
            require_privileges: false,
            strict_dependencies: default_strict_dependencies(),
        }
    }
}

/// `[service.<name>]` section.
///
/// Both commands are argv lists; the first element is the program. A status
/// command exiting 0 means "running".
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub status: Vec<String>,

    /// Empty means the service cannot be started by us.
    #[serde(default)]
    pub start: Vec<String>,

    /// How long to keep polling `status` after `start` succeeded.
    #[serde(
        default = "default_startup_timeout",
        deserialize_with = "super::duration::deserialize"
    )]
    pub startup_timeout: Duration,
}

fn default_startup_timeout() -> Duration {
    Duration::from_secs(5)
}

/// `[[role]]` entry: one kind of worker, launched `count` times.
#[derive(Debug, Clone, Deserialize)]
pub struct RoleConfig {
    pub label: String,

    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Relative paths are resolved against the config file's directory.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    #[serde(default = "default_count")]
    pub count: usize,

    #[serde(default)]
    pub depends_on_service: Option<String>,

    /// Keep `label` verbatim instead of `label-<i>`. Only valid with
    /// `count = 1`.
    #[serde(default)]
    pub exact_label: bool,
}

fn default_count() -> usize {
    1
}
