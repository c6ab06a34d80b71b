// src/supervisor/signals.rs

//! Waiting for the end of a run.
//!
//! Termination requests arrive as `TerminationReason`s on an mpsc channel,
//! fed by [`spawn_signal_sources`] in production and directly by tests.
//! The timeout is handled inside the wait itself.

use std::io::BufRead;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::exec::ProcessBackend;
use crate::types::TerminationReason;

use super::{Supervisor, SupervisorSession};

impl<B: ProcessBackend> Supervisor<B> {
    /// Block the orchestration until a termination reason fires.
    ///
    /// While waiting, children are polled every `poll_interval` so exits are
    /// logged as they happen. Children keep running regardless.
    pub async fn await_termination_signal(
        &self,
        session: &mut SupervisorSession,
        signals: &mut mpsc::Receiver<TerminationReason>,
    ) -> TerminationReason {
        let timeout = self.options.timeout;
        let deadline = async move {
            match timeout {
                Some(dur) => tokio::time::sleep(dur).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline);

        let mut ticker = tokio::time::interval(self.options.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut sources_open = true;

        loop {
            tokio::select! {
                biased;

                event = signals.recv(), if sources_open => match event {
                    Some(reason) => {
                        info!(%reason, "termination requested");
                        return reason;
                    }
                    None => {
                        sources_open = false;
                        if timeout.is_none() {
                            warn!("all termination sources closed and no timeout set; tearing down");
                            return TerminationReason::Interrupted;
                        }
                        debug!("termination sources closed; waiting for timeout only");
                    }
                },

                _ = &mut deadline => {
                    info!(?timeout, "timeout elapsed");
                    return TerminationReason::TimeoutElapsed;
                }

                _ = ticker.tick() => {
                    let exited = session.poll_liveness();
                    if !exited.is_empty() {
                        debug!(
                            ?exited,
                            still_running = session.running_count(),
                            "observed process exits while waiting"
                        );
                    }
                }
            }
        }
    }
}

/// Wire the production termination sources into `tx`:
/// - Enter on stdin (read on a dedicated thread so a pending read never
///   holds up runtime shutdown; end-of-file is not a confirmation)
/// - Ctrl-C
/// - SIGTERM (unix)
pub fn spawn_signal_sources(tx: mpsc::Sender<TerminationReason>) {
    {
        let tx = tx.clone();
        let spawned = std::thread::Builder::new()
            .name("operator-input".to_string())
            .spawn(move || {
                let mut line = String::new();
                match std::io::stdin().lock().read_line(&mut line) {
                    Ok(0) => debug!("stdin closed; operator confirmation unavailable"),
                    Ok(_) => {
                        let _ = tx.blocking_send(TerminationReason::OperatorConfirmed);
                    }
                    Err(e) => warn!(error = %e, "reading operator input failed"),
                }
            });
        if let Err(e) = spawned {
            warn!(error = %e, "could not start operator input thread");
        }
    }

    {
        let tx = tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            let _ = tx.send(TerminationReason::Interrupted).await;
        });
    }

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::spawn(async move {
                    if sigterm.recv().await.is_some() {
                        let _ = tx.send(TerminationReason::Interrupted).await;
                    }
                });
            }
            Err(e) => warn!(error = %e, "failed to listen for SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    drop(tx);
}
