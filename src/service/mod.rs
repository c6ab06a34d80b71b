// src/service/mod.rs

//! Dependency services: long-running processes (e.g. a message broker)
//! that workers need but which we only query and start.
//!
//! The supervisor talks to a [`ServiceController`]; production uses
//! [`CommandServiceController`], which runs the configured `status` /
//! `start` commands. Tests plug in a fake controller.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{anyhow, Context};
use tokio::process::Command;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::config::ServiceConfig;
use crate::errors::{FanoutError, Result};

/// Interval between `status` polls while waiting for a freshly started
/// service.
const STARTUP_POLL_INTERVAL: Duration = Duration::from_millis(250);

pub type ServiceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Start / query-status interface to an externally managed service.
pub trait ServiceController: Send + Sync {
    fn is_running<'a>(&'a self, service: &'a str) -> ServiceFuture<'a, bool>;

    fn start<'a>(&'a self, service: &'a str) -> ServiceFuture<'a, ()>;

    /// How long a started service may take to report running.
    fn startup_timeout(&self, _service: &str) -> Duration {
        Duration::from_secs(5)
    }
}

/// Make sure `service` is running, starting it if needed.
///
/// Returns `DependencyUnavailable` when the service is still not running
/// after the start attempt and the startup window.
pub async fn ensure_dependency_running(
    controller: &dyn ServiceController,
    service: &str,
) -> Result<()> {
    let unavailable = |reason: String| FanoutError::DependencyUnavailable {
        service: service.to_string(),
        reason,
    };

    match controller.is_running(service).await {
        Ok(true) => {
            info!(service, "dependency service already running");
            return Ok(());
        }
        Ok(false) => info!(service, "dependency service not running; starting it"),
        Err(e) => warn!(service, error = %e, "status check failed; trying to start anyway"),
    }

    controller
        .start(service)
        .await
        .map_err(|e| unavailable(format!("start failed: {e}")))?;

    // An unrepresentable startup window means "keep waiting".
    let deadline = Instant::now().checked_add(controller.startup_timeout(service));
    loop {
        match controller.is_running(service).await {
            Ok(true) => {
                info!(service, "dependency service started");
                return Ok(());
            }
            Ok(false) => {}
            Err(e) => debug!(service, error = %e, "status check failed while starting"),
        }

        if deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(unavailable(
                "still not running after start attempt".to_string(),
            ));
        }
        sleep(STARTUP_POLL_INTERVAL).await;
    }
}

/// Controller that shells out to the commands from `[service.<name>]`.
#[derive(Debug, Clone, Default)]
pub struct CommandServiceController {
    services: BTreeMap<String, ServiceConfig>,
}

impl CommandServiceController {
    pub fn new(services: BTreeMap<String, ServiceConfig>) -> Self {
        Self { services }
    }

    fn config_of(&self, service: &str) -> Result<&ServiceConfig> {
        self.services.get(service).ok_or_else(|| FanoutError::DependencyUnavailable {
            service: service.to_string(),
            reason: "service is not declared in the config".to_string(),
        })
    }
}

impl ServiceController for CommandServiceController {
    fn is_running<'a>(&'a self, service: &'a str) -> ServiceFuture<'a, bool> {
        Box::pin(async move {
            let cfg = self.config_of(service)?;
            let success = run_argv(&cfg.status)
                .await
                .with_context(|| format!("querying status of service '{service}'"))?;
            debug!(service, running = success, "service status checked");
            Ok(success)
        })
    }

    fn start<'a>(&'a self, service: &'a str) -> ServiceFuture<'a, ()> {
        Box::pin(async move {
            let cfg = self.config_of(service)?;
            if cfg.start.is_empty() {
                return Err(anyhow!("service '{service}' has no start command").into());
            }
            let success = run_argv(&cfg.start)
                .await
                .with_context(|| format!("starting service '{service}'"))?;
            if !success {
                return Err(anyhow!("start command for '{service}' exited unsuccessfully").into());
            }
            Ok(())
        })
    }

    fn startup_timeout(&self, service: &str) -> Duration {
        self.services
            .get(service)
            .map(|s| s.startup_timeout)
            .unwrap_or(Duration::from_secs(5))
    }
}

/// Run an argv list to completion and report whether it exited 0.
async fn run_argv(argv: &[String]) -> anyhow::Result<bool> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| anyhow!("empty command"))?;

    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .with_context(|| format!("running '{program}'"))?;

    Ok(status.success())
}
