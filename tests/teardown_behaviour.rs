// tests/teardown_behaviour.rs

mod common;
use crate::common::{init_tracing, with_timeout};

use fanout::supervisor::{ProcessSpec, Supervisor};
use fanout::types::ProcessState;
use fanout_test_utils::builders::{fast_options, specs};
use fanout_test_utils::fake_backend::{Behaviour, FakeBackend, FakeEvent};

#[tokio::test]
async fn cooperative_processes_stop_without_force() {
    with_timeout(async {
        init_tracing();

        let backend = FakeBackend::new();
        let probe = backend.clone();
        let mut supervisor = Supervisor::new(backend, fast_options()).unwrap();
        let mut session = supervisor.launch_all(&specs("sub", "python", 3));

        let report = supervisor.teardown(&mut session).await;

        assert_eq!(report.entries.len(), 3);
        for entry in &report.entries {
            assert_eq!(entry.final_state, ProcessState::Exited(143));
            assert!(!entry.forced_kill);
        }
        assert!(!report.has_failures());
        assert_eq!(probe.count(&FakeEvent::Killed("sub-1".into())), 0);
    })
    .await
}

#[tokio::test]
async fn stubborn_process_is_force_killed_after_graceful_attempt() {
    with_timeout(async {
        init_tracing();

        let backend = FakeBackend::new().with_behaviour("stubborn", Behaviour::IgnoresTerminate);
        let probe = backend.clone();
        let mut supervisor = Supervisor::new(backend, fast_options()).unwrap();

        let input = vec![
            ProcessSpec::new("pub-1", "python"),
            ProcessSpec::new("hold-out", "stubborn"),
        ];
        let mut session = supervisor.launch_all(&input);

        let report = supervisor.teardown(&mut session).await;

        let pub1 = report.entry("pub-1").unwrap();
        assert_eq!(pub1.final_state, ProcessState::Exited(143));
        assert!(!pub1.forced_kill);

        let hold_out = report.entry("hold-out").unwrap();
        assert_eq!(hold_out.final_state, ProcessState::Killed);
        assert!(hold_out.forced_kill);

        // Graceful stop always precedes the forced kill for a process.
        let events = probe.events();
        let terminated = events
            .iter()
            .position(|e| *e == FakeEvent::Terminated("hold-out".into()))
            .unwrap();
        let killed = events
            .iter()
            .position(|e| *e == FakeEvent::Killed("hold-out".into()))
            .unwrap();
        assert!(terminated < killed);
    })
    .await
}

#[tokio::test]
async fn second_teardown_is_a_no_op_with_same_states() {
    with_timeout(async {
        init_tracing();

        let backend = FakeBackend::new()
            .with_behaviour("stubborn", Behaviour::IgnoresTerminate)
            .with_missing_command("missing");
        let probe = backend.clone();
        let mut supervisor = Supervisor::new(backend, fast_options()).unwrap();

        let input = vec![
            ProcessSpec::new("a", "python"),
            ProcessSpec::new("b", "stubborn"),
            ProcessSpec::new("c", "missing"),
        ];
        let mut session = supervisor.launch_all(&input);

        let first = supervisor.teardown(&mut session).await;
        let events_after_first = probe.events().len();
        let second = supervisor.teardown(&mut session).await;

        assert_eq!(probe.events().len(), events_after_first, "no additional work");
        assert_eq!(first.entries.len(), second.entries.len());
        for (f, s) in first.entries.iter().zip(second.entries.iter()) {
            assert_eq!(f.label, s.label);
            assert_eq!(f.final_state, s.final_state);
            assert_eq!(f.pid, s.pid);
            assert!(!s.forced_kill);
        }
        assert!(first.entry("b").unwrap().forced_kill);
    })
    .await
}

#[tokio::test]
async fn kill_failure_is_recorded_and_does_not_stop_the_rest() {
    with_timeout(async {
        init_tracing();

        let backend = FakeBackend::new()
            .with_behaviour("immortal", Behaviour::KillFails)
            .with_behaviour("stubborn", Behaviour::IgnoresTerminate);
        let mut supervisor = Supervisor::new(backend, fast_options()).unwrap();

        let input = vec![
            ProcessSpec::new("immortal-1", "immortal"),
            ProcessSpec::new("stubborn-1", "stubborn"),
            ProcessSpec::new("pub-1", "python"),
        ];
        let mut session = supervisor.launch_all(&input);

        let report = supervisor.teardown(&mut session).await;

        match &report.entry("immortal-1").unwrap().final_state {
            ProcessState::Failed(reason) => assert!(reason.contains("force kill failed")),
            other => panic!("expected Failed, got {other:?}"),
        }
        assert!(!report.entry("immortal-1").unwrap().forced_kill);
        assert_eq!(report.entry("stubborn-1").unwrap().final_state, ProcessState::Killed);
        assert_eq!(report.entry("pub-1").unwrap().final_state, ProcessState::Exited(143));
        assert_eq!(report.failure_count(), 1);
    })
    .await
}

#[tokio::test]
async fn without_graceful_stop_processes_are_killed_immediately() {
    with_timeout(async {
        init_tracing();

        let backend = FakeBackend::new().with_behaviour("winproc", Behaviour::NoGracefulStop);
        let mut options = fast_options();
        // A long grace period must not be waited out when nothing was asked
        // to stop gracefully.
        options.grace_period = std::time::Duration::from_secs(30);
        let mut supervisor = Supervisor::new(backend, options).unwrap();
        let mut session = supervisor.launch_all(&specs("w", "winproc", 2));

        let started = std::time::Instant::now();
        let report = supervisor.teardown(&mut session).await;

        assert!(started.elapsed() < std::time::Duration::from_secs(5));
        assert!(report.entries.iter().all(|e| e.forced_kill));
        assert!(report.entries.iter().all(|e| e.final_state == ProcessState::Killed));
    })
    .await
}

#[tokio::test]
async fn launch_failures_stay_failed_through_teardown() {
    with_timeout(async {
        init_tracing();

        let backend = FakeBackend::new().with_missing_command("missing");
        let mut supervisor = Supervisor::new(backend, fast_options()).unwrap();
        let mut session = supervisor.launch_all(&[ProcessSpec::new("gone", "missing")]);

        let report = supervisor.teardown(&mut session).await;
        let gone = report.entry("gone").unwrap();
        assert!(gone.final_state.is_failure());
        assert!(!gone.forced_kill);
        assert_eq!(gone.pid, None);
    })
    .await
}

#[tokio::test]
async fn oversized_grace_and_reap_windows_do_not_panic() {
    with_timeout(async {
        init_tracing();

        let backend = FakeBackend::new().with_behaviour("winproc", Behaviour::NoGracefulStop);
        let mut options = fast_options();
        options.grace_period = std::time::Duration::from_secs(u64::MAX);
        options.reap_timeout = std::time::Duration::from_secs(u64::MAX);
        let mut supervisor = Supervisor::new(backend, options).unwrap();

        let input = vec![
            ProcessSpec::new("pub-1", "python"),
            ProcessSpec::new("win-1", "winproc"),
        ];
        let mut session = supervisor.launch_all(&input);

        let report = supervisor.teardown(&mut session).await;

        assert_eq!(report.entry("pub-1").unwrap().final_state, ProcessState::Exited(143));
        let win = report.entry("win-1").unwrap();
        assert_eq!(win.final_state, ProcessState::Killed);
        assert!(win.forced_kill);
    })
    .await
}
