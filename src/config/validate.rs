// src/config/validate.rs

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{FanoutError, Result};

impl ConfigFile {
    /// Validate `raw` and attach the directory relative paths resolve against.
    pub fn from_raw(raw: RawConfigFile, base_dir: PathBuf) -> Result<Self> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw, base_dir))
    }
}

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = FanoutError;

    /// Validates against the current working directory.
    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        ConfigFile::from_raw(raw, base_dir)
    }
}

pub fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_roles(cfg)?;
    validate_global_config(cfg)?;
    validate_services(cfg)?;
    validate_roles(cfg)?;
    validate_unique_labels(cfg)?;
    Ok(())
}

const LABEL_PATTERN: &str = r"^[A-Za-z0-9_.-]+$";

fn label_regex() -> Result<&'static Regex> {
    static RE: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(LABEL_PATTERN))
        .as_ref()
        .map_err(|e| FanoutError::ConfigError(format!("label pattern failed to compile: {e}")))
}

fn ensure_has_roles(cfg: &RawConfigFile) -> Result<()> {
    if cfg.role.is_empty() {
        return Err(FanoutError::ConfigError(
            "config must contain at least one [[role]] entry".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    // Durations and output mode are typed and checked during
    // deserialization already.
    if cfg.config.grace_period.is_zero() {
        return Err(FanoutError::ConfigError(
            "[config].grace_period must be greater than zero".to_string(),
        ));
    }
    if cfg.config.poll_interval.is_zero() {
        return Err(FanoutError::ConfigError(
            "[config].poll_interval must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_services(cfg: &RawConfigFile) -> Result<()> {
    for (name, service) in cfg.service.iter() {
        if service.status.first().is_none_or(|p| p.trim().is_empty()) {
            return Err(FanoutError::ConfigError(format!(
                "service '{}' needs a non-empty `status` command",
                name
            )));
        }
        if service.start.first().is_some_and(|p| p.trim().is_empty()) {
            return Err(FanoutError::ConfigError(format!(
                "service '{}' has an empty program in `start`",
                name
            )));
        }
    }
    Ok(())
}

fn validate_roles(cfg: &RawConfigFile) -> Result<()> {
    let label_re = label_regex()?;
    for role in cfg.role.iter() {
        if !label_re.is_match(&role.label) {
            return Err(FanoutError::ConfigError(format!(
                "role label '{}' must be non-empty and only use letters, digits, '_', '.' or '-'",
                role.label
            )));
        }
        if role.command.trim().is_empty() {
            return Err(FanoutError::ConfigError(format!(
                "role '{}' has an empty `command`",
                role.label
            )));
        }
        if role.count == 0 {
            return Err(FanoutError::ConfigError(format!(
                "role '{}': count must be >= 1 (got 0)",
                role.label
            )));
        }
        if role.exact_label && role.count != 1 {
            return Err(FanoutError::ConfigError(format!(
                "role '{}': exact_label requires count = 1 (got {})",
                role.label, role.count
            )));
        }
        if let Some(ref service) = role.depends_on_service {
            if !cfg.service.contains_key(service) {
                return Err(FanoutError::ConfigError(format!(
                    "role '{}' depends on unknown service '{}'",
                    role.label, service
                )));
            }
        }
    }
    Ok(())
}

/// Check label uniqueness on the expanded list using the configured counts.
///
/// Count overrides from the CLI are re-checked at expansion time.
fn validate_unique_labels(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = HashSet::new();
    for role in cfg.role.iter() {
        for label in super::expand::role_labels(role, None) {
            if !seen.insert(label.clone()) {
                return Err(FanoutError::ConfigError(format!(
                    "duplicate process label '{}'",
                    label
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_pattern_accepts_plain_names_only() {
        let re = label_regex().unwrap();
        for ok in ["publisher", "sub_1", "broker.v2", "a-b"] {
            assert!(re.is_match(ok), "{ok} should be accepted");
        }
        for bad in ["", "my publisher", "pub/1", "ünï"] {
            assert!(!re.is_match(bad), "{bad:?} should be rejected");
        }
    }
}
