// tests/dependency_checks.rs

mod common;
use crate::common::{init_tracing, with_timeout};

use std::error::Error;
use std::time::Duration;

use tokio::sync::mpsc;

use fanout::errors::FanoutError;
use fanout::supervise;
use fanout::supervisor::{ProcessSpec, Supervisor};
use fanout::types::{ProcessState, RunStatus, TerminationReason};
use fanout_test_utils::builders::fast_options;
use fanout_test_utils::fake_backend::FakeBackend;
use fanout_test_utils::fake_services::FakeServices;

type TestResult = Result<(), Box<dyn Error>>;

fn broker_topology() -> Vec<ProcessSpec> {
    vec![
        ProcessSpec::new("publisher-1", "python").depends_on("broker"),
        ProcessSpec::new("subscriber-1", "python").depends_on("broker"),
        ProcessSpec::new("logger-1", "python"),
    ]
}

#[tokio::test]
async fn unavailable_service_aborts_with_exit_code_1_and_nothing_started() {
    with_timeout(async {
        init_tracing();

        let services = FakeServices::new().with_service("broker", false, false);
        let backend = FakeBackend::new();
        let probe = backend.clone();
        let (_tx, rx) = mpsc::channel::<TerminationReason>(1);

        let err = supervise(&broker_topology(), backend, &services, rx, fast_options())
            .await
            .unwrap_err();

        assert!(matches!(err, FanoutError::DependencyUnavailable { ref service, .. } if service == "broker"));
        assert_eq!(err.exit_code(), 1);
        assert!(probe.spawned().is_empty(), "no process may be started");
        assert_eq!(services.start_calls(), vec!["broker".to_string()]);
    })
    .await
}

#[tokio::test]
async fn stopped_service_is_started_before_launching() -> TestResult {
    with_timeout(async {
        init_tracing();

        let services = FakeServices::new().with_service("broker", false, true);
        let backend = FakeBackend::new();
        let probe = backend.clone();
        let (tx, rx) = mpsc::channel::<TerminationReason>(1);
        tx.send(TerminationReason::OperatorConfirmed).await?;

        let outcome = supervise(&broker_topology(), backend, &services, rx, fast_options()).await?;

        assert_eq!(services.start_calls(), vec!["broker".to_string()]);
        assert_eq!(probe.spawned().len(), 3);
        assert_eq!(outcome.reason, TerminationReason::OperatorConfirmed);
        assert_eq!(outcome.status, RunStatus::Clean);
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}

#[tokio::test]
async fn running_service_is_checked_once_and_not_restarted() {
    with_timeout(async {
        init_tracing();

        let services = FakeServices::new().with_service("broker", true, false);
        let supervisor = Supervisor::new(FakeBackend::new(), fast_options()).unwrap();

        let unavailable = supervisor
            .check_dependencies(&services, &broker_topology())
            .await
            .unwrap();

        assert!(unavailable.is_empty());
        assert!(services.start_calls().is_empty());
    })
    .await
}

#[tokio::test]
async fn lenient_mode_skips_only_dependents_and_reports_degraded() -> TestResult {
    with_timeout(async {
        init_tracing();

        let services = FakeServices::new().with_service("broker", false, false);
        let backend = FakeBackend::new();
        let probe = backend.clone();
        let (tx, rx) = mpsc::channel::<TerminationReason>(1);
        tx.send(TerminationReason::Interrupted).await?;

        let mut options = fast_options();
        options.strict_dependencies = false;

        let outcome = supervise(&broker_topology(), backend, &services, rx, options).await?;

        assert_eq!(probe.spawned(), vec!["logger-1".to_string()]);
        assert_eq!(outcome.report.entries.len(), 3);
        assert_eq!(
            outcome.report.entry("publisher-1").unwrap().final_state,
            ProcessState::Failed("dependency service 'broker' unavailable".to_string())
        );
        assert_eq!(
            outcome.report.entry("logger-1").unwrap().final_state,
            ProcessState::Exited(143)
        );
        assert_eq!(outcome.status, RunStatus::Degraded);
        assert_eq!(outcome.status.exit_code(), 3);
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}

#[tokio::test]
async fn timeout_drives_a_full_clean_session() -> TestResult {
    with_timeout(async {
        init_tracing();

        let services = FakeServices::new();
        let (_tx, rx) = mpsc::channel::<TerminationReason>(1);
        let mut options = fast_options();
        options.timeout = Some(Duration::from_millis(100));

        let specs = vec![
            ProcessSpec::new("pub-1", "echo").with_args(["hi"]),
            ProcessSpec::new("pub-2", "echo").with_args(["hi"]),
        ];
        let outcome = supervise(&specs, FakeBackend::new(), &services, rx, options).await?;

        assert_eq!(outcome.reason, TerminationReason::TimeoutElapsed);
        assert_eq!(outcome.status.exit_code(), 0);
        assert!(outcome.summary().contains("stopped by timeout elapsed"));
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}

#[tokio::test]
async fn launch_failure_alone_degrades_the_run() -> TestResult {
    with_timeout(async {
        init_tracing();

        let services = FakeServices::new();
        let backend = FakeBackend::new().with_missing_command("no-such-binary");
        let (tx, rx) = mpsc::channel::<TerminationReason>(1);
        tx.send(TerminationReason::OperatorConfirmed).await?;

        let specs = vec![
            ProcessSpec::new("pub-1", "python"),
            ProcessSpec::new("broken", "no-such-binary"),
        ];
        let outcome = supervise(&specs, backend, &services, rx, fast_options()).await?;

        assert!(matches!(
            outcome.report.entry("broken").unwrap().final_state,
            ProcessState::Failed(_)
        ));
        assert_eq!(
            outcome.report.entry("pub-1").unwrap().final_state,
            ProcessState::Exited(143)
        );
        assert_eq!(outcome.status, RunStatus::Degraded);
        assert_eq!(outcome.status.exit_code(), 3);
        assert!(outcome.summary().contains("1 failed"));
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}
