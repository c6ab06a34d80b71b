// src/supervisor/session.rs

use std::time::{Duration, Instant};

use super::process::ManagedProcess;

/// All processes of one run, in launch order.
///
/// The session is the single owner of every child handle.
#[derive(Debug)]
pub struct SupervisorSession {
    processes: Vec<ManagedProcess>,
    started_at: Instant,
}

impl SupervisorSession {
    /// `started_at` is taken before the first spawn so the launch phase
    /// counts towards the session duration.
    pub(crate) fn new(processes: Vec<ManagedProcess>, started_at: Instant) -> Self {
        Self {
            processes,
            started_at,
        }
    }

    pub fn processes(&self) -> &[ManagedProcess] {
        &self.processes
    }

    pub(crate) fn processes_mut(&mut self) -> &mut [ManagedProcess] {
        &mut self.processes
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<&ManagedProcess> {
        self.processes.iter().find(|p| p.label() == label)
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn running_count(&self) -> usize {
        self.processes
            .iter()
            .filter(|p| p.state().is_running())
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.processes
            .iter()
            .filter(|p| p.state().is_failure())
            .count()
    }

    /// Reap every child that has exited since the last poll.
    ///
    /// Returns the labels of the processes whose exit was observed now.
    pub(crate) fn poll_liveness(&mut self) -> Vec<String> {
        self.processes
            .iter_mut()
            .filter_map(|p| p.poll_exit().map(|_| p.label().to_string()))
            .collect()
    }
}
