// src/config/demo.rs

//! Built-in topology used when no config file is available: a local MQTT
//! broker plus three publishers and three subscribers.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::model::{ConfigFile, ConfigSection, RawConfigFile, RoleConfig, ServiceConfig};
use crate::errors::Result;

pub const DEMO_SERVICE: &str = "mosquitto";
const DEMO_COUNT: usize = 3;

pub fn demo_config() -> Result<ConfigFile> {
    ConfigFile::try_from(demo_raw_config())
}

pub fn demo_raw_config() -> RawConfigFile {
    let mut service = BTreeMap::new();
    service.insert(DEMO_SERVICE.to_string(), broker_service());

    RawConfigFile {
        config: ConfigSection::default(),
        service,
        role: vec![
            python_role("publisher", "group_5_publisher.py"),
            python_role("subscriber", "group_5_subscriber.py"),
        ],
    }
}

fn python_role(label: &str, script: &str) -> RoleConfig {
    let interpreter = if cfg!(windows) { "python" } else { "python3" };
    RoleConfig {
        label: label.to_string(),
        command: interpreter.to_string(),
        args: vec![script.to_string()],
        working_dir: None,
        count: DEMO_COUNT,
        depends_on_service: Some(DEMO_SERVICE.to_string()),
        exact_label: false,
    }
}

fn broker_service() -> ServiceConfig {
    let argv = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    let (status, start) = if cfg!(windows) {
        (
            argv(&[
                "powershell",
                "-NoProfile",
                "-Command",
                "if ((Get-Service mosquitto).Status -ne 'Running') { exit 1 }",
            ]),
            argv(&["net", "start", DEMO_SERVICE]),
        )
    } else {
        (
            argv(&["systemctl", "is-active", "--quiet", DEMO_SERVICE]),
            argv(&["systemctl", "start", DEMO_SERVICE]),
        )
    };

    ServiceConfig {
        status,
        start,
        startup_timeout: Duration::from_secs(5),
    }
}
