// src/supervisor/mod.rs

//! The process group supervisor.
//!
//! One run goes through four phases, each a method on [`Supervisor`]:
//! 1. [`Supervisor::check_dependencies`]: make sure required services run.
//! 2. [`Supervisor::launch_all`]: spawn every spec, in order, fire-and-forget.
//! 3. [`Supervisor::await_termination_signal`]: wait for Enter, timeout or
//!    an interrupt while polling liveness.
//! 4. [`Supervisor::teardown`]: graceful stop, grace period, forced kill.
//!
//! Process creation goes through a [`ProcessBackend`] so the whole
//! lifecycle can be exercised without real processes.

pub mod process;
pub mod report;
pub mod session;
pub mod signals;
pub mod teardown;

use std::collections::{BTreeSet, HashSet};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config::ConfigSection;
use crate::errors::{FanoutError, Result};
use crate::exec::ProcessBackend;
use crate::service::{ensure_dependency_running, ServiceController};

pub use process::{ManagedProcess, ProcessSpec};
pub use report::{TeardownEntry, TeardownReport};
pub use session::SupervisorSession;

/// Timing and policy knobs for one supervisor.
#[derive(Debug, Clone)]
pub struct SupervisorOptions {
    /// Time between the graceful stop and the forced kill.
    pub grace_period: Duration,
    /// How long to wait for a force-killed process to be reaped.
    pub reap_timeout: Duration,
    /// Liveness polling interval while waiting.
    pub poll_interval: Duration,
    /// Automatic teardown after this long.
    pub timeout: Option<Duration>,
    /// Abort before launching if a dependency service is unavailable.
    pub strict_dependencies: bool,
}

impl SupervisorOptions {
    pub fn from_config(cfg: &ConfigSection) -> Self {
        Self {
            grace_period: cfg.grace_period,
            poll_interval: cfg.poll_interval,
            timeout: cfg.timeout,
            strict_dependencies: cfg.strict_dependencies,
            ..Self::default()
        }
    }
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            grace_period: Duration::from_secs(3),
            reap_timeout: Duration::from_secs(2),
            poll_interval: Duration::from_secs(1),
            timeout: None,
            strict_dependencies: true,
        }
    }
}

pub struct Supervisor<B: ProcessBackend> {
    backend: B,
    options: SupervisorOptions,
}

impl<B: ProcessBackend> std::fmt::Debug for Supervisor<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<B: ProcessBackend> Supervisor<B> {
    /// Create a supervisor, failing with `Fatal` if the backend cannot
    /// create processes.
    pub fn new(backend: B, options: SupervisorOptions) -> Result<Self> {
        backend.probe()?;
        Ok(Self { backend, options })
    }

    pub fn options(&self) -> &SupervisorOptions {
        &self.options
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Ensure every service referenced by `specs` is running.
    ///
    /// Each distinct service is checked once, in order of first reference.
    /// In strict mode the first unavailable service is returned as an error;
    /// otherwise the names of all unavailable services are returned so the
    /// processes depending on them can be skipped.
    pub async fn check_dependencies(
        &self,
        services: &dyn ServiceController,
        specs: &[ProcessSpec],
    ) -> Result<BTreeSet<String>> {
        let mut unavailable = BTreeSet::new();
        let mut checked = HashSet::new();

        for service in specs.iter().filter_map(|s| s.depends_on_service()) {
            if !checked.insert(service) {
                continue;
            }

            if let Err(err) = ensure_dependency_running(services, service).await {
                if self.options.strict_dependencies {
                    return Err(err);
                }
                warn!(
                    service,
                    error = %err,
                    "dependency service unavailable; dependent processes will not be launched"
                );
                unavailable.insert(service.to_string());
            }
        }

        Ok(unavailable)
    }

    /// Launch every spec in order.
    ///
    /// The session holds exactly one entry per spec, in input order, whether
    /// or not the individual spawn succeeded.
    pub fn launch_all(&mut self, specs: &[ProcessSpec]) -> SupervisorSession {
        self.launch_all_except(specs, &BTreeSet::new())
    }

    /// Like [`launch_all`](Self::launch_all), but specs depending on one of
    /// `unavailable_services` are recorded as failed without being spawned.
    pub fn launch_all_except(
        &mut self,
        specs: &[ProcessSpec],
        unavailable_services: &BTreeSet<String>,
    ) -> SupervisorSession {
        let started_at = Instant::now();
        let mut processes = Vec::with_capacity(specs.len());
        let mut labels = HashSet::new();

        for spec in specs {
            let mut entry = ManagedProcess::starting(spec.clone());

            if !labels.insert(spec.label().to_string()) {
                warn!(label = %spec.label(), "duplicate label; not launching");
                entry.mark_failed("duplicate label");
                processes.push(entry);
                continue;
            }

            if let Some(service) = spec
                .depends_on_service()
                .filter(|s| unavailable_services.contains(*s))
            {
                entry.mark_failed(format!("dependency service '{service}' unavailable"));
                processes.push(entry);
                continue;
            }

            match self.backend.spawn(spec) {
                Ok(handle) => {
                    entry.mark_running(handle);
                    info!(
                        label = %spec.label(),
                        pid = ?entry.pid(),
                        command = %spec.command(),
                        "launched"
                    );
                }
                Err(err) => {
                    let reason = match err {
                        FanoutError::LaunchFailure { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    warn!(label = %spec.label(), reason = %reason, "launch failed");
                    entry.mark_failed(reason);
                }
            }

            processes.push(entry);
        }

        let session = SupervisorSession::new(processes, started_at);
        info!(
            launched = session.running_count(),
            failed = session.failed_count(),
            "launch complete"
        );
        session
    }
}
