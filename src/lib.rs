// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod privileges;
pub mod service;
pub mod supervisor;
pub mod types;

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{resolve_config, ConfigFile};
use crate::errors::{Result, SupervisorInitFailure};
use crate::exec::{ProcessBackend, RealProcessBackend};
use crate::privileges::has_required_privileges;
use crate::service::{CommandServiceController, ServiceController};
use crate::supervisor::signals::spawn_signal_sources;
use crate::supervisor::{ProcessSpec, Supervisor, SupervisorOptions, TeardownReport};
use crate::types::{RunStatus, TerminationReason};

/// Everything a finished run reports back.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub reason: TerminationReason,
    pub report: TeardownReport,
    pub elapsed: Duration,
    pub status: RunStatus,
}

impl SessionOutcome {
    pub fn summary(&self) -> String {
        self.report.render_summary(Some(self.reason), self.elapsed)
    }
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file or built-in demo) and CLI overrides
/// - the privilege precondition
/// - the real process backend and service controller
/// - stdin / Ctrl-C / SIGTERM termination sources
pub async fn run(args: CliArgs) -> Result<RunStatus> {
    let cfg = resolve_config(args.config.as_deref())?;
    let specs = cfg.process_specs(args.count.map(|c| c as usize))?;
    let options = options_from(&cfg, &args);

    if args.dry_run {
        print_dry_run(&cfg, &specs, &options);
        return Ok(RunStatus::DryRun);
    }

    if cfg.config.require_privileges && !has_required_privileges() {
        return Err(SupervisorInitFailure::MissingPrivileges.into());
    }

    let backend = RealProcessBackend::new(cfg.config.output);
    let services = CommandServiceController::new(cfg.service.clone());

    let (signal_tx, signal_rx) = mpsc::channel::<TerminationReason>(8);
    spawn_signal_sources(signal_tx);

    match options.timeout {
        Some(t) => info!("press Enter or Ctrl-C to stop (automatic teardown in {:?})", t),
        None => info!("press Enter or Ctrl-C to stop all processes"),
    }

    let outcome = supervise(&specs, backend, &services, signal_rx, options).await?;
    print!("{}", outcome.summary());
    Ok(outcome.status)
}

/// One full supervisor lifecycle over an arbitrary backend.
///
/// Dependency checks run before anything is spawned; in strict mode an
/// unavailable service returns `DependencyUnavailable` with zero processes
/// started. Everything after launching is infallible.
pub async fn supervise<B: ProcessBackend>(
    specs: &[ProcessSpec],
    backend: B,
    services: &dyn ServiceController,
    mut signals: mpsc::Receiver<TerminationReason>,
    options: SupervisorOptions,
) -> Result<SessionOutcome> {
    let mut supervisor = Supervisor::new(backend, options)?;

    let unavailable = supervisor.check_dependencies(services, specs).await?;
    let mut session = supervisor.launch_all_except(specs, &unavailable);

    let reason = supervisor
        .await_termination_signal(&mut session, &mut signals)
        .await;
    let report = supervisor.teardown(&mut session).await;

    let status = if report.has_failures() {
        RunStatus::Degraded
    } else {
        RunStatus::Clean
    };

    Ok(SessionOutcome {
        reason,
        report,
        elapsed: session.elapsed(),
        status,
    })
}

/// Config values with CLI flags layered on top.
fn options_from(cfg: &ConfigFile, args: &CliArgs) -> SupervisorOptions {
    let mut options = SupervisorOptions::from_config(&cfg.config);
    if let Some(secs) = args.timeout {
        options.timeout = Some(Duration::from_secs(secs));
    }
    if let Some(secs) = args.grace_period {
        options.grace_period = Duration::from_secs(secs);
    }
    if args.allow_missing_services {
        options.strict_dependencies = false;
    }
    options
}

/// Simple dry-run output: print services, processes and timing.
fn print_dry_run(cfg: &ConfigFile, specs: &[ProcessSpec], options: &SupervisorOptions) {
    println!("fanout dry-run");
    println!("  grace_period = {:?}", options.grace_period);
    println!("  timeout = {:?}", options.timeout);
    println!("  strict_dependencies = {}", options.strict_dependencies);
    println!("  output = {:?}", cfg.config.output);
    println!();

    let required = cfg.required_services();
    if !required.is_empty() {
        println!("services ({}):", required.len());
        for name in required.iter() {
            if let Some(svc) = cfg.service.get(name) {
                println!("  - {name}");
                println!("      status: {:?}", svc.status);
                if !svc.start.is_empty() {
                    println!("      start: {:?}", svc.start);
                }
            }
        }
        println!();
    }

    println!("processes ({}):", specs.len());
    for spec in specs {
        println!("  - {}", spec.label());
        println!("      cmd: {} {:?}", spec.command(), spec.args());
        println!("      cwd: {}", spec.working_dir().display());
        if let Some(service) = spec.depends_on_service() {
            println!("      depends_on_service: {service}");
        }
    }

    debug!("dry-run complete (nothing started)");
}
