#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use fanout::config::{ConfigFile, ConfigSection, RawConfigFile, RoleConfig, ServiceConfig};
use fanout::supervisor::{ProcessSpec, SupervisorOptions};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
    base_dir: PathBuf,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                service: BTreeMap::new(),
                role: Vec::new(),
            },
            base_dir: PathBuf::from("."),
        }
    }

    pub fn with_role(mut self, role: RoleConfig) -> Self {
        self.config.role.push(role);
        self
    }

    /// Declare a service whose status / start are plain argv lists.
    pub fn with_service(mut self, name: &str, status: &[&str], start: &[&str]) -> Self {
        self.config.service.insert(
            name.to_string(),
            ServiceConfig {
                status: status.iter().map(|s| s.to_string()).collect(),
                start: start.iter().map(|s| s.to_string()).collect(),
                startup_timeout: Duration::from_millis(500),
            },
        );
        self
    }

    pub fn grace_period(mut self, d: Duration) -> Self {
        self.config.config.grace_period = d;
        self
    }

    pub fn timeout(mut self, d: Duration) -> Self {
        self.config.config.timeout = Some(d);
        self
    }

    pub fn lenient_dependencies(mut self) -> Self {
        self.config.config.strict_dependencies = false;
        self
    }

    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::from_raw(self.config, self.base_dir)
            .expect("Failed to build valid config from builder")
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `RoleConfig`.
pub struct RoleBuilder {
    role: RoleConfig,
}

impl RoleBuilder {
    pub fn new(label: &str, command: &str) -> Self {
        Self {
            role: RoleConfig {
                label: label.to_string(),
                command: command.to_string(),
                args: vec![],
                working_dir: None,
                count: 1,
                depends_on_service: None,
                exact_label: false,
            },
        }
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.role.args.push(arg.to_string());
        self
    }

    pub fn count(mut self, n: usize) -> Self {
        self.role.count = n;
        self
    }

    pub fn working_dir(mut self, dir: &str) -> Self {
        self.role.working_dir = Some(PathBuf::from(dir));
        self
    }

    pub fn depends_on(mut self, service: &str) -> Self {
        self.role.depends_on_service = Some(service.to_string());
        self
    }

    pub fn exact_label(mut self) -> Self {
        self.role.exact_label = true;
        self
    }

    pub fn build(self) -> RoleConfig {
        self.role
    }
}

/// `n` specs labelled `<prefix>-1..=n`, all running `command`.
pub fn specs(prefix: &str, command: &str, n: usize) -> Vec<ProcessSpec> {
    (1..=n)
        .map(|i| ProcessSpec::new(format!("{prefix}-{i}"), command))
        .collect()
}

/// Supervisor options with short timings suitable for tests.
pub fn fast_options() -> SupervisorOptions {
    SupervisorOptions {
        grace_period: Duration::from_millis(200),
        reap_timeout: Duration::from_millis(500),
        poll_interval: Duration::from_millis(20),
        timeout: None,
        strict_dependencies: true,
    }
}
