// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`command`] describes a single external invocation (`CommandSpec`) and
//!   how it finished (`CommandOutcome`).
//! - [`runner`] spawns one build command with `tokio::process::Command` and
//!   forwards its output to the log.
//! - [`backend`] provides the `CommandBackend` trait and the
//!   `RealCommandBackend` the build pipeline uses in production, and which
//!   tests replace with a fake implementation.
//! - [`launch`] starts the long-running server process.

pub mod backend;
pub mod command;
pub mod launch;
pub mod runner;

pub use backend::{CommandBackend, RealCommandBackend};
pub use command::{CommandOutcome, CommandSpec};
pub use launch::{LaunchSpec, check_port_available, launch};
