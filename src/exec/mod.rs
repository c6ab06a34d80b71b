// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually creating and signalling the
//! worker processes, using `tokio::process::Command`.
//!
//! - [`backend`] provides the `ProcessBackend` / `ProcessHandle` traits and
//!   the `RealProcessBackend` used in production, which tests replace with
//!   a fake implementation.
//! - [`output`] forwards captured child output into the log.

pub mod backend;
pub mod output;

pub use backend::{GracefulStop, ProcessBackend, ProcessHandle, RealProcessBackend};
