// src/supervisor/process.rs

//! What to launch (`ProcessSpec`) and what was launched (`ManagedProcess`).

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::exec::ProcessHandle;
use crate::types::ProcessState;

/// Immutable description of one worker process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    label: String,
    command: String,
    args: Vec<String>,
    working_dir: PathBuf,
    depends_on_service: Option<String>,
}

impl ProcessSpec {
    /// A spec running `command` with no arguments in `.`.
    pub fn new(label: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            command: command.into(),
            args: Vec::new(),
            working_dir: PathBuf::from("."),
            depends_on_service: None,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    pub fn depends_on(mut self, service: impl Into<String>) -> Self {
        self.depends_on_service = Some(service.into());
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn depends_on_service(&self) -> Option<&str> {
        self.depends_on_service.as_deref()
    }
}

/// A launched (or failed-to-launch) process owned by the supervisor.
///
/// The handle is dropped as soon as the process has been reaped; after that
/// the entry only carries its final state.
#[derive(Debug)]
pub struct ManagedProcess {
    spec: ProcessSpec,
    handle: Option<Box<dyn ProcessHandle>>,
    pid: Option<u32>,
    state: ProcessState,
}

impl ManagedProcess {
    pub(crate) fn starting(spec: ProcessSpec) -> Self {
        Self {
            spec,
            handle: None,
            pid: None,
            state: ProcessState::Starting,
        }
    }

    pub fn spec(&self) -> &ProcessSpec {
        &self.spec
    }

    pub fn label(&self) -> &str {
        self.spec.label()
    }

    pub fn state(&self) -> &ProcessState {
        &self.state
    }

    /// Pid recorded at spawn time, kept after the process is reaped.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub(crate) fn mark_running(&mut self, handle: Box<dyn ProcessHandle>) {
        self.pid = handle.id();
        self.handle = Some(handle);
        self.state = ProcessState::Running;
    }

    pub(crate) fn mark_failed(&mut self, reason: impl Into<String>) {
        self.handle = None;
        self.state = ProcessState::Failed(reason.into());
    }

    pub(crate) fn mark_killed(&mut self) {
        self.handle = None;
        self.state = ProcessState::Killed;
    }

    pub(crate) fn handle_mut(&mut self) -> Option<&mut (dyn ProcessHandle + 'static)> {
        self.handle.as_deref_mut()
    }

    /// Reap the process if it has exited; returns the exit code the first
    /// time an exit is observed.
    pub(crate) fn poll_exit(&mut self) -> Option<i32> {
        if !self.state.is_running() {
            return None;
        }
        let handle = self.handle.as_mut()?;

        match handle.try_wait() {
            Ok(Some(code)) => {
                info!(label = %self.spec.label, pid = ?self.pid, exit_code = code, "process exited");
                self.handle = None;
                self.state = ProcessState::Exited(code);
                Some(code)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(label = %self.spec.label, pid = ?self.pid, error = %e, "polling process status failed");
                None
            }
        }
    }
}
