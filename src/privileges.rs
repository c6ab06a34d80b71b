// src/privileges.rs

//! Elevated-rights precondition.
//!
//! Starting system services usually needs root / Administrator. Instead of
//! relaunching ourselves elevated we only check, and let the caller turn a
//! `false` into a fatal init failure.

/// Whether the current process runs with elevated rights.
#[cfg(unix)]
pub fn has_required_privileges() -> bool {
    nix::unistd::geteuid().is_root()
}

/// Whether the current process runs with elevated rights.
///
/// `net session` only succeeds for members of the Administrators group
/// running elevated.
#[cfg(windows)]
pub fn has_required_privileges() -> bool {
    use std::process::{Command, Stdio};

    Command::new("net")
        .arg("session")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(not(any(unix, windows)))]
pub fn has_required_privileges() -> bool {
    false
}
