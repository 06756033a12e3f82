// src/pipeline/step.rs

use std::future::Future;
use std::pin::Pin;

use crate::errors::{LaunchpadError, Result};
use crate::exec::{CommandBackend, CommandOutcome, CommandSpec};
use crate::fs::FileSystem;
use crate::pipeline::state::BuildState;
use crate::plan::BuildPlan;

/// What a step hands back on success: a digest of the content it added,
/// which the runner chains into the layer digest.
pub type StepFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

/// Collaborators shared by every build step.
pub struct BuildContext<'a> {
    pub plan: &'a BuildPlan,
    pub fs: &'a dyn FileSystem,
    pub backend: &'a mut dyn CommandBackend,
}

/// One stage of the bootstrap workflow.
pub trait BuildStep: Send + Sync {
    fn name(&self) -> &'static str;

    /// State the build is in once this step succeeds.
    fn target(&self) -> BuildState;

    /// Commands the step will run, for `plan` output.
    fn commands(&self, plan: &BuildPlan) -> Vec<CommandSpec> {
        let _ = plan;
        Vec::new()
    }

    fn run<'a, 'ctx>(&'a self, ctx: &'a mut BuildContext<'ctx>) -> StepFuture<'a>
    where
        'ctx: 'a;
}

/// Turn a command outcome into a step result.
pub fn ensure_success(spec: &CommandSpec, outcome: CommandOutcome) -> Result<()> {
    match outcome {
        CommandOutcome::Success => Ok(()),
        CommandOutcome::Failed(code) => Err(LaunchpadError::step_failed(
            spec.step.clone(),
            Some(code),
            format!("'{}' exited with status {}", spec, code),
        )),
        CommandOutcome::TimedOut => Err(LaunchpadError::step_failed(
            spec.step.clone(),
            None,
            format!(
                "'{}' did not finish within {:?}",
                spec,
                spec.timeout.unwrap_or_default()
            ),
        )),
    }
}
