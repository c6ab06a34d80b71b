// src/supervisor/report.rs

use std::fmt::Write as _;
use std::time::Duration;

use crate::types::{ProcessState, TerminationReason};

use super::SupervisorSession;

/// Outcome of teardown for one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeardownEntry {
    pub label: String,
    pub pid: Option<u32>,
    pub final_state: ProcessState,
    /// A forced kill was needed during *this* teardown call.
    pub forced_kill: bool,
}

/// Per-process teardown results, in launch order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub entries: Vec<TeardownEntry>,
}

impl TeardownReport {
    pub(crate) fn from_session(session: &SupervisorSession, forced: &[bool]) -> Self {
        let entries = session
            .processes()
            .iter()
            .zip(forced)
            .map(|(p, &forced_kill)| TeardownEntry {
                label: p.label().to_string(),
                pid: p.pid(),
                final_state: p.state().clone(),
                forced_kill,
            })
            .collect();
        Self { entries }
    }

    pub fn entry(&self, label: &str) -> Option<&TeardownEntry> {
        self.entries.iter().find(|e| e.label == label)
    }

    pub fn has_failures(&self) -> bool {
        self.entries.iter().any(|e| e.final_state.is_failure())
    }

    pub fn failure_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.final_state.is_failure())
            .count()
    }

    pub fn forced_count(&self) -> usize {
        self.entries.iter().filter(|e| e.forced_kill).count()
    }

    /// Human-readable summary, one line per process plus a footer.
    ///
    /// Failed entries are prefixed `!!`, everything else `ok`.
    pub fn render_summary(&self, reason: Option<TerminationReason>, elapsed: Duration) -> String {
        let width = self
            .entries
            .iter()
            .map(|e| e.label.len())
            .max()
            .unwrap_or(0);

        let mut out = String::new();
        let _ = writeln!(out, "fanout summary ({} processes):", self.entries.len());
        for e in &self.entries {
            let marker = if e.final_state.is_failure() { "!!" } else { "ok" };
            let pid = e
                .pid
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string());
            let forced = if e.forced_kill { " (forced)" } else { "" };
            let _ = writeln!(
                out,
                "  {marker} {:<width$}  pid={:<7} {}{}",
                e.label, pid, e.final_state, forced
            );
        }

        let reason = reason
            .map(|r| r.to_string())
            .unwrap_or_else(|| "none".to_string());
        let _ = writeln!(
            out,
            "stopped by {reason} after {:.1}s; {} failed, {} force-killed",
            elapsed.as_secs_f64(),
            self.failure_count(),
            self.forced_count()
        );
        out
    }
}
