// src/config/expand.rs

//! Turning `[[role]]` entries into the flat, ordered list of `ProcessSpec`s
//! the supervisor launches.

use std::collections::HashSet;
use std::path::PathBuf;

use tracing::debug;

use crate::config::model::{ConfigFile, RoleConfig};
use crate::errors::{FanoutError, Result};
use crate::supervisor::ProcessSpec;

/// Labels a role expands to, in launch order.
///
/// `count_override` replaces the configured count, except for `exact_label`
/// roles which always launch exactly once.
pub fn role_labels(role: &RoleConfig, count_override: Option<usize>) -> Vec<String> {
    if role.exact_label {
        return vec![role.label.clone()];
    }
    let count = count_override.unwrap_or(role.count);
    (1..=count).map(|i| format!("{}-{}", role.label, i)).collect()
}

impl ConfigFile {
    /// Expand all roles into process specs, in file order.
    ///
    /// Instances of one role are contiguous. Fails if an override makes two
    /// labels collide.
    pub fn process_specs(&self, count_override: Option<usize>) -> Result<Vec<ProcessSpec>> {
        let mut specs = Vec::new();
        let mut seen = HashSet::new();

        for role in self.role.iter() {
            let working_dir = self.resolve_working_dir(role);

            for label in role_labels(role, count_override) {
                if !seen.insert(label.clone()) {
                    return Err(FanoutError::ConfigError(format!(
                        "duplicate process label '{}' after applying --count",
                        label
                    )));
                }

                let mut spec = ProcessSpec::new(label, role.command.clone())
                    .with_args(role.args.iter().cloned())
                    .in_dir(working_dir.clone());
                if let Some(ref service) = role.depends_on_service {
                    spec = spec.depends_on(service.clone());
                }
                specs.push(spec);
            }
        }

        debug!(count = specs.len(), "expanded roles into process specs");
        Ok(specs)
    }

    fn resolve_working_dir(&self, role: &RoleConfig) -> PathBuf {
        match role.working_dir {
            Some(ref dir) if dir.is_absolute() => dir.clone(),
            Some(ref dir) => self.base_dir.join(dir),
            None => self.base_dir.clone(),
        }
    }

    /// Services referenced by at least one role, in order of first reference.
    pub fn required_services(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for role in self.role.iter() {
            if let Some(ref service) = role.depends_on_service {
                if !out.contains(service) {
                    out.push(service.clone());
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::RawConfigFile;

    fn cfg(toml_src: &str) -> ConfigFile {
        let raw: RawConfigFile = toml::from_str(toml_src).unwrap();
        ConfigFile::from_raw(raw, PathBuf::from("/srv/demo")).unwrap()
    }

    const TWO_ROLES: &str = r#"
[service.broker]
status = ["true"]

[[role]]
label = "pub"
command = "python"
args = ["pub.py"]
count = 2
depends_on_service = "broker"

[[role]]
label = "sub"
command = "python"
args = ["sub.py"]
working_dir = "subs"
"#;

    #[test]
    fn roles_expand_in_order_with_numbered_labels() {
        let specs = cfg(TWO_ROLES).process_specs(None).unwrap();
        let labels: Vec<_> = specs.iter().map(|s| s.label()).collect();
        assert_eq!(labels, vec!["pub-1", "pub-2", "sub-1"]);

        assert_eq!(specs[0].args(), ["pub.py".to_string()]);
        assert_eq!(specs[0].depends_on_service(), Some("broker"));
        assert_eq!(specs[0].working_dir(), PathBuf::from("/srv/demo").as_path());
        assert_eq!(specs[2].working_dir(), PathBuf::from("/srv/demo/subs").as_path());
        assert_eq!(specs[2].depends_on_service(), None);
    }

    #[test]
    fn count_override_applies_to_every_role() {
        let specs = cfg(TWO_ROLES).process_specs(Some(3)).unwrap();
        assert_eq!(specs.len(), 6);
        assert_eq!(specs[5].label(), "sub-3");
    }

    #[test]
    fn override_collision_is_reported() {
        let c = cfg(
            r#"
[[role]]
label = "w"
command = "true"

[[role]]
label = "w-2"
command = "true"
exact_label = true
"#,
        );
        assert!(c.process_specs(None).is_ok());
        let err = c.process_specs(Some(2)).unwrap_err();
        assert!(err.to_string().contains("duplicate process label 'w-2'"));
    }

    #[test]
    fn required_services_are_deduplicated_in_first_use_order() {
        let c = cfg(
            r#"
[service.a]
status = ["true"]
[service.b]
status = ["true"]
[service.unused]
status = ["true"]

[[role]]
label = "x"
command = "true"
depends_on_service = "b"

[[role]]
label = "y"
command = "true"
depends_on_service = "a"

[[role]]
label = "z"
command = "true"
depends_on_service = "b"
"#,
        );
        assert_eq!(c.required_services(), vec!["b".to_string(), "a".to_string()]);
    }
}
