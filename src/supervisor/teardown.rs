// src/supervisor/teardown.rs

//! Coordinated shutdown of a session.

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use crate::errors::FanoutError;
use crate::exec::{GracefulStop, ProcessBackend};
use crate::types::ProcessState;

use super::{Supervisor, SupervisorSession, TeardownReport};

/// Upper bound on a single wait step while polling for exits.
const EXIT_POLL_STEP: Duration = Duration::from_millis(50);

impl<B: ProcessBackend> Supervisor<B> {
    /// Stop every process that is still running.
    ///
    /// 1. Poll once so processes that already exited are recorded as such.
    /// 2. Send a graceful stop to every running process.
    /// 3. Wait up to `grace_period` for them to exit.
    /// 4. Force-kill the survivors and wait up to `reap_timeout` for them.
    ///
    /// Never fails: per-process problems end up as `Failed` entries. Calling
    /// it again on a stopped session touches nothing and reports
    /// `forced_kill = false` everywhere.
    pub async fn teardown(&self, session: &mut SupervisorSession) -> TeardownReport {
        let mut forced = vec![false; session.len()];

        session.poll_liveness();

        let targets: Vec<usize> = session
            .processes()
            .iter()
            .enumerate()
            .filter(|(_, p)| p.state().is_running())
            .map(|(i, _)| i)
            .collect();

        if targets.is_empty() {
            debug!("teardown: nothing left running");
            return TeardownReport::from_session(session, &forced);
        }

        info!(count = targets.len(), "stopping running processes");

        let mut stopping = Vec::new();
        for &i in &targets {
            let proc = &mut session.processes_mut()[i];
            let label = proc.label().to_string();
            let pid = proc.pid();
            let Some(handle) = proc.handle_mut() else {
                continue;
            };

            match handle.terminate() {
                Ok(GracefulStop::Sent) => {
                    stopping.push(i);
                    debug!(label = %label, ?pid, "graceful stop requested");
                }
                Ok(GracefulStop::Unsupported) => {
                    debug!(label = %label, ?pid, "graceful stop unsupported; will force kill");
                }
                Err(e) => {
                    warn!(label = %label, ?pid, error = %e, "graceful stop failed; will force kill");
                }
            }
        }

        // Only processes that were asked to stop get the grace period.
        if !stopping.is_empty() {
            wait_for_exits(session, &stopping, self.options.grace_period).await;
        }

        let mut killed = Vec::new();
        for &i in &targets {
            let proc = &mut session.processes_mut()[i];
            if !proc.state().is_running() {
                continue;
            }

            let label = proc.label().to_string();
            let pid = proc.pid();
            warn!(label = %label, ?pid, "still alive after grace period; force killing");

            let result = match proc.handle_mut() {
                Some(handle) => handle.kill(),
                None => Ok(()),
            };

            match result {
                Ok(()) => {
                    forced[i] = true;
                    killed.push(i);
                }
                Err(e) => {
                    let err = FanoutError::TeardownFailure {
                        label,
                        reason: format!("force kill failed: {e}"),
                    };
                    error!(error = %err, "teardown failure");
                    proc.mark_failed(format!("force kill failed: {e}"));
                }
            }
        }

        if !killed.is_empty() {
            wait_for_exits(session, &killed, self.options.reap_timeout).await;

            for &i in &killed {
                let proc = &mut session.processes_mut()[i];
                let state = proc.state().clone();
                match state {
                    ProcessState::Running => {
                        let err = FanoutError::TeardownFailure {
                            label: proc.label().to_string(),
                            reason: "process did not exit after forced kill".to_string(),
                        };
                        error!(error = %err, "teardown failure");
                        proc.mark_failed("process did not exit after forced kill");
                    }
                    ProcessState::Exited(_) => proc.mark_killed(),
                    _ => {}
                }
            }
        }

        let report = TeardownReport::from_session(session, &forced);
        info!(
            forced = report.forced_count(),
            failed = report.failure_count(),
            "teardown complete"
        );
        report
    }
}

/// Poll `indices` until none is running or `window` has elapsed.
///
/// A window too large to represent as an `Instant` waits without a deadline.
async fn wait_for_exits(session: &mut SupervisorSession, indices: &[usize], window: Duration) {
    let deadline = Instant::now().checked_add(window);

    loop {
        let mut any_running = false;
        for &i in indices {
            let proc = &mut session.processes_mut()[i];
            proc.poll_exit();
            any_running |= proc.state().is_running();
        }

        if !any_running {
            return;
        }

        let step = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return;
                }
                EXIT_POLL_STEP.min(deadline - now)
            }
            None => EXIT_POLL_STEP,
        };
        sleep(step).await;
    }
}
