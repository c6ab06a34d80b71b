use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Lifecycle state of a managed child process.
///
/// Only the supervisor moves a process between states:
/// `Starting -> Running -> {Exited, Killed, Failed}`, or straight from
/// `Starting` to `Failed` when spawning fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessState {
    Starting,
    Running,
    /// The process exited on its own or after a graceful stop.
    Exited(i32),
    /// The process had to be force-killed.
    Killed,
    Failed(String),
}

impl ProcessState {
    pub fn is_running(&self) -> bool {
        matches!(self, ProcessState::Running)
    }

    /// Whether this state should be flagged in the final summary.
    pub fn is_failure(&self) -> bool {
        matches!(self, ProcessState::Failed(_))
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessState::Starting => write!(f, "starting"),
            ProcessState::Running => write!(f, "running"),
            ProcessState::Exited(code) => write!(f, "exited({code})"),
            ProcessState::Killed => write!(f, "killed"),
            ProcessState::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Why the supervisor stopped waiting and moved on to teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// The operator pressed Enter.
    OperatorConfirmed,
    /// The configured timeout elapsed.
    TimeoutElapsed,
    /// Ctrl-C / SIGTERM was received.
    Interrupted,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TerminationReason::OperatorConfirmed => "operator confirmation",
            TerminationReason::TimeoutElapsed => "timeout elapsed",
            TerminationReason::Interrupted => "interrupt",
        };
        f.write_str(s)
    }
}

/// Overall result of a run that got past initialisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Everything launched and was torn down cleanly.
    Clean,
    /// At least one process failed to launch or to stop.
    Degraded,
    /// `--dry-run`: nothing was started.
    DryRun,
}

impl RunStatus {
    pub fn exit_code(self) -> i32 {
        match self {
            RunStatus::Clean | RunStatus::DryRun => 0,
            RunStatus::Degraded => 3,
        }
    }
}

/// What to do with a child's stdout / stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Pipe both streams and re-emit each line as a log event.
    Log,
    /// Share the supervisor's own streams.
    Inherit,
    /// Discard.
    Null,
}

impl Default for OutputMode {
    fn default() -> Self {
        OutputMode::Log
    }
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "log" => Ok(OutputMode::Log),
            "inherit" => Ok(OutputMode::Inherit),
            "null" => Ok(OutputMode::Null),
            other => Err(format!(
                "invalid output mode: {other} (expected \"log\", \"inherit\" or \"null\")"
            )),
        }
    }
}
