// src/exec/backend.rs

//! Pluggable process backend abstraction.
//!
//! The supervisor talks to a `ProcessBackend` instead of `tokio::process`
//! directly. This makes it easy to swap in a fake backend in tests while
//! keeping the production implementation here.
//!
//! - `RealProcessBackend` spawns OS processes with `tokio::process::Command`
//!   and signals them by the pid recorded at spawn time.
//! - Tests provide their own backend whose handles simulate exits, ignored
//!   terminate requests and failing kills.

use std::fmt;
use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, Command};
use tracing::debug;

use crate::errors::{FanoutError, Result, SupervisorInitFailure};
use crate::supervisor::ProcessSpec;
use crate::types::OutputMode;

use super::output::forward_output;

/// Result of asking a process to stop cooperatively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GracefulStop {
    /// The request was delivered (or the process was already gone).
    Sent,
    /// This platform / handle has no cooperative stop; go straight to kill.
    Unsupported,
}

/// Handle to one spawned child, owned by its `ManagedProcess`.
pub trait ProcessHandle: Send + fmt::Debug {
    /// OS process id, while known.
    fn id(&self) -> Option<u32>;

    /// Non-blocking reap: `Some(exit_code)` once the process has exited.
    fn try_wait(&mut self) -> Result<Option<i32>>;

    /// Ask the process to stop (SIGTERM on unix).
    fn terminate(&mut self) -> Result<GracefulStop>;

    /// Force the process to stop. Does not wait for it to be reaped.
    fn kill(&mut self) -> Result<()>;
}

/// Trait abstracting how processes are created.
pub trait ProcessBackend: Send {
    /// Check that processes can be created at all.
    ///
    /// Failure here is the only fatal supervisor error.
    fn probe(&self) -> Result<()>;

    /// Spawn one child. Must not block on the child.
    fn spawn(&mut self, spec: &ProcessSpec) -> Result<Box<dyn ProcessHandle>>;
}

/// Real backend used in production.
#[derive(Debug, Clone)]
pub struct RealProcessBackend {
    output: OutputMode,
}

impl RealProcessBackend {
    pub fn new(output: OutputMode) -> Self {
        Self { output }
    }
}

impl ProcessBackend for RealProcessBackend {
    fn probe(&self) -> Result<()> {
        // `tokio::process` needs a runtime to drive child reaping.
        tokio::runtime::Handle::try_current()
            .map_err(|e| SupervisorInitFailure::NoProcessBackend(e.to_string()))?;
        Ok(())
    }

    fn spawn(&mut self, spec: &ProcessSpec) -> Result<Box<dyn ProcessHandle>> {
        let launch_err = |reason: String| FanoutError::LaunchFailure {
            label: spec.label().to_string(),
            reason,
        };

        if !spec.working_dir().is_dir() {
            return Err(launch_err(format!(
                "working directory {} does not exist",
                spec.working_dir().display()
            )));
        }

        let mut cmd = Command::new(spec.command());
        cmd.args(spec.args())
            .current_dir(spec.working_dir())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        match self.output {
            OutputMode::Log => {
                cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
            }
            OutputMode::Inherit => {
                cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            }
            OutputMode::Null => {
                cmd.stdout(Stdio::null()).stderr(Stdio::null());
            }
        }

        detach_from_console(&mut cmd);

        let mut child = cmd
            .spawn()
            .map_err(|e| launch_err(format!("spawning '{}': {}", spec.command(), e)))?;

        let pid = child.id();
        debug!(label = %spec.label(), ?pid, "spawned child process");

        forward_output(spec.label(), child.stdout.take(), child.stderr.take());

        Ok(Box::new(RealProcessHandle {
            label: spec.label().to_string(),
            pid,
            child,
        }))
    }
}

/// Keep terminal Ctrl-C away from children; only the supervisor stops them.
#[cfg(unix)]
fn detach_from_console(cmd: &mut Command) {
    cmd.process_group(0);
}

#[cfg(windows)]
fn detach_from_console(cmd: &mut Command) {
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
    cmd.creation_flags(CREATE_NEW_PROCESS_GROUP);
}

#[cfg(not(any(unix, windows)))]
fn detach_from_console(_cmd: &mut Command) {}

#[derive(Debug)]
struct RealProcessHandle {
    label: String,
    /// Pid captured at spawn; `Child::id` forgets it once reaped.
    pid: Option<u32>,
    child: Child,
}

impl ProcessHandle for RealProcessHandle {
    fn id(&self) -> Option<u32> {
        self.pid
    }

    fn try_wait(&mut self) -> Result<Option<i32>> {
        Ok(self.child.try_wait()?.map(exit_code_of))
    }

    #[cfg(unix)]
    fn terminate(&mut self) -> Result<GracefulStop> {
        use nix::errno::Errno;
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        // `Child::id` is None once reaped: never signal a recycled pid.
        let Some(pid) = self.child.id() else {
            return Ok(GracefulStop::Sent);
        };

        match kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            Ok(()) => {
                debug!(label = %self.label, pid, "sent SIGTERM");
                Ok(GracefulStop::Sent)
            }
            Err(Errno::ESRCH) => Ok(GracefulStop::Sent),
            Err(e) => Err(std::io::Error::from(e).into()),
        }
    }

    #[cfg(not(unix))]
    fn terminate(&mut self) -> Result<GracefulStop> {
        Ok(GracefulStop::Unsupported)
    }

    fn kill(&mut self) -> Result<()> {
        self.child.start_kill()?;
        debug!(label = %self.label, pid = ?self.pid, "sent kill");
        Ok(())
    }
}

/// Map an exit status to a single code; signal deaths become `128 + signal`.
fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    -1
}
