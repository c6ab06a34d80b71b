use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fanout::errors::{FanoutError, Result, SupervisorInitFailure};
use fanout::exec::{GracefulStop, ProcessBackend, ProcessHandle};
use fanout::supervisor::ProcessSpec;

/// How a fake process reacts, keyed by the spec's command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    /// Runs until terminated; exits 143 on the graceful stop.
    RunsUntilStopped,
    /// Ignores the graceful stop; only a kill ends it.
    IgnoresTerminate,
    /// Has already exited with this code by the first poll.
    ExitsImmediately(i32),
    /// Ignores the graceful stop and the kill request fails.
    KillFails,
    /// The handle has no cooperative stop at all.
    NoGracefulStop,
}

/// Everything the supervisor did to fake processes, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeEvent {
    Spawned(String),
    Terminated(String),
    Killed(String),
}

#[derive(Debug, Default)]
struct Inner {
    behaviours: HashMap<String, Behaviour>,
    missing: HashSet<String>,
    events: Vec<FakeEvent>,
    next_pid: u32,
    probe_fails: bool,
    spawn_delay: Duration,
}

/// A fake backend that never creates real processes.
///
/// Clones share state, so a test can keep one clone to inspect `events()`
/// after moving the other into the supervisor.
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    inner: Arc<Mutex<Inner>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behaviour(self, command: &str, behaviour: Behaviour) -> Self {
        self.inner
            .lock()
            .unwrap()
            .behaviours
            .insert(command.to_string(), behaviour);
        self
    }

    /// Spawning this command fails as if the executable did not exist.
    pub fn with_missing_command(self, command: &str) -> Self {
        self.inner
            .lock()
            .unwrap()
            .missing
            .insert(command.to_string());
        self
    }

    /// Every spawn blocks for `delay`, like a slow `fork`/`exec`.
    pub fn with_spawn_delay(self, delay: Duration) -> Self {
        self.inner.lock().unwrap().spawn_delay = delay;
        self
    }

    pub fn with_failing_probe(self) -> Self {
        self.inner.lock().unwrap().probe_fails = true;
        self
    }

    pub fn events(&self) -> Vec<FakeEvent> {
        self.inner.lock().unwrap().events.clone()
    }

    pub fn spawned(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                FakeEvent::Spawned(label) => Some(label),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, event: &FakeEvent) -> usize {
        self.events().iter().filter(|e| *e == event).count()
    }
}

impl ProcessBackend for FakeBackend {
    fn probe(&self) -> Result<()> {
        if self.inner.lock().unwrap().probe_fails {
            return Err(SupervisorInitFailure::NoProcessBackend("fake backend disabled".into()).into());
        }
        Ok(())
    }

    fn spawn(&mut self, spec: &ProcessSpec) -> Result<Box<dyn ProcessHandle>> {
        let delay = self.inner.lock().unwrap().spawn_delay;
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        let mut inner = self.inner.lock().unwrap();

        if inner.missing.contains(spec.command()) {
            return Err(FanoutError::LaunchFailure {
                label: spec.label().to_string(),
                reason: format!("spawning '{}': No such file or directory", spec.command()),
            });
        }

        inner.next_pid += 1;
        let pid = 1000 + inner.next_pid;
        let behaviour = inner
            .behaviours
            .get(spec.command())
            .copied()
            .unwrap_or(Behaviour::RunsUntilStopped);
        inner.events.push(FakeEvent::Spawned(spec.label().to_string()));

        let exit = match behaviour {
            Behaviour::ExitsImmediately(code) => Some(code),
            _ => None,
        };

        Ok(Box::new(FakeHandle {
            label: spec.label().to_string(),
            pid,
            behaviour,
            exit,
            inner: Arc::clone(&self.inner),
        }))
    }
}

#[derive(Debug)]
struct FakeHandle {
    label: String,
    pid: u32,
    behaviour: Behaviour,
    exit: Option<i32>,
    inner: Arc<Mutex<Inner>>,
}

impl FakeHandle {
    fn record(&self, event: FakeEvent) {
        self.inner.lock().unwrap().events.push(event);
    }
}

impl ProcessHandle for FakeHandle {
    fn id(&self) -> Option<u32> {
        Some(self.pid)
    }

    fn try_wait(&mut self) -> Result<Option<i32>> {
        Ok(self.exit)
    }

    fn terminate(&mut self) -> Result<GracefulStop> {
        self.record(FakeEvent::Terminated(self.label.clone()));
        match self.behaviour {
            Behaviour::RunsUntilStopped => {
                self.exit = Some(143);
                Ok(GracefulStop::Sent)
            }
            Behaviour::NoGracefulStop => Ok(GracefulStop::Unsupported),
            Behaviour::IgnoresTerminate
            | Behaviour::KillFails
            | Behaviour::ExitsImmediately(_) => Ok(GracefulStop::Sent),
        }
    }

    fn kill(&mut self) -> Result<()> {
        self.record(FakeEvent::Killed(self.label.clone()));
        if self.behaviour == Behaviour::KillFails {
            return Err(std::io::Error::other("operation not permitted").into());
        }
        self.exit = Some(137);
        Ok(())
    }
}
