// src/exec/backend.rs

//! Pluggable command backend.
//!
//! Build steps talk to a `CommandBackend` instead of spawning processes
//! directly, so tests can swap in a fake that records commands and replays
//! scripted outcomes.

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;
use crate::exec::command::{CommandOutcome, CommandSpec};
use crate::exec::runner::run_command;

/// Trait abstracting how build commands are executed.
pub trait CommandBackend: Send {
    /// Run the command to completion and report how it finished.
    ///
    /// `Err` is reserved for failures to run the command at all (e.g. the
    /// program does not exist); a non-zero exit is `Ok(Failed(code))`.
    fn run(
        &mut self,
        spec: CommandSpec,
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutcome>> + Send + '_>>;
}

/// Real backend used in production: spawns OS processes.
#[derive(Debug, Default)]
pub struct RealCommandBackend;

impl RealCommandBackend {
    pub fn new() -> Self {
        Self
    }
}

impl CommandBackend for RealCommandBackend {
    fn run(
        &mut self,
        spec: CommandSpec,
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutcome>> + Send + '_>> {
        Box::pin(async move { Ok(run_command(&spec).await?) })
    }
}
