// tests/config_loading.rs

use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use fanout::config::load_and_validate;
use fanout::supervisor::SupervisorOptions;
use fanout::types::OutputMode;
use fanout_test_utils::builders::{ConfigFileBuilder, RoleBuilder};

type TestResult = Result<(), Box<dyn Error>>;

fn demos_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos")
}

#[test]
fn mqtt_demo_expands_to_three_publishers_and_three_subscribers() -> TestResult {
    let cfg = load_and_validate(demos_dir().join("mqtt-demo.toml"))?;

    assert_eq!(cfg.config.grace_period, Duration::from_secs(3));
    assert_eq!(cfg.config.timeout, None);
    assert_eq!(cfg.config.output, OutputMode::Log);
    assert!(cfg.config.strict_dependencies);
    assert_eq!(cfg.required_services(), vec!["mosquitto".to_string()]);

    let specs = cfg.process_specs(None)?;
    let labels: Vec<_> = specs.iter().map(|s| s.label()).collect();
    assert_eq!(
        labels,
        vec![
            "publisher-1",
            "publisher-2",
            "publisher-3",
            "subscriber-1",
            "subscriber-2",
            "subscriber-3",
        ]
    );

    // Relative working dirs resolve against the directory of the file.
    assert!(specs.iter().all(|s| s.working_dir() == demos_dir().as_path()));
    assert_eq!(specs[0].args(), ["group_5_publisher.py".to_string()]);
    Ok(())
}

#[test]
fn mqtt_demo_count_override_scales_every_role() -> TestResult {
    let cfg = load_and_validate(demos_dir().join("mqtt-demo.toml"))?;
    let specs = cfg.process_specs(Some(5))?;

    assert_eq!(specs.len(), 10);
    assert_eq!(specs[4].label(), "publisher-5");
    assert_eq!(specs[9].label(), "subscriber-5");
    Ok(())
}

#[test]
fn local_workers_demo_keeps_exact_label_under_override() -> TestResult {
    let cfg = load_and_validate(demos_dir().join("local-workers.toml"))?;
    assert_eq!(cfg.config.timeout, Some(Duration::from_secs(10)));
    assert!(cfg.required_services().is_empty());

    let specs = cfg.process_specs(Some(4))?;
    let labels: Vec<_> = specs.iter().map(|s| s.label()).collect();
    assert_eq!(labels.len(), 9);
    assert_eq!(labels.last(), Some(&"logger"));
    Ok(())
}

#[test]
fn options_follow_config_section() {
    let cfg = ConfigFileBuilder::new()
        .with_role(RoleBuilder::new("pub", "python3").count(2).build())
        .grace_period(Duration::from_millis(750))
        .timeout(Duration::from_secs(20))
        .lenient_dependencies()
        .build();

    let options = SupervisorOptions::from_config(&cfg.config);
    assert_eq!(options.grace_period, Duration::from_millis(750));
    assert_eq!(options.timeout, Some(Duration::from_secs(20)));
    assert!(!options.strict_dependencies);
    assert_eq!(options.reap_timeout, SupervisorOptions::default().reap_timeout);
}

#[test]
fn builder_roles_resolve_working_dir_against_base_dir() -> TestResult {
    let cfg = ConfigFileBuilder::new()
        .with_service("broker", &["true"], &[])
        .with_role(
            RoleBuilder::new("sub", "python3")
                .arg("sub.py")
                .working_dir("clients")
                .depends_on("broker")
                .build(),
        )
        .base_dir("/opt/demo")
        .build();

    let specs = cfg.process_specs(None)?;
    assert_eq!(specs.len(), 1);
    assert_eq!(specs[0].working_dir(), PathBuf::from("/opt/demo/clients").as_path());
    assert_eq!(specs[0].depends_on_service(), Some("broker"));
    Ok(())
}
