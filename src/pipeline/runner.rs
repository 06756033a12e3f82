// src/pipeline/runner.rs

use tracing::{error, info};

use crate::errors::Result;
use crate::fingerprint::chain_digest;
use crate::pipeline::layers::{LayerRecord, LayerStore};
use crate::pipeline::state::BuildState;
use crate::pipeline::step::{BuildContext, BuildStep};
use crate::pipeline::steps::{CollectStatic, InstallDependencies, MaterializeSource, Provision};

/// Outcome of a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub state: BuildState,
    pub layers: Vec<LayerRecord>,
}

impl BuildReport {
    /// Digest of the topmost layer, which covers every layer below it.
    pub fn image_digest(&self) -> Option<&str> {
        self.layers.last().map(|l| l.digest.as_str())
    }
}

/// Ordered, fail-fast list of build steps.
pub struct Pipeline {
    steps: Vec<Box<dyn BuildStep>>,
}

impl Pipeline {
    pub fn new(steps: Vec<Box<dyn BuildStep>>) -> Self {
        Self { steps }
    }

    /// Provision → install dependencies → materialize source → collect static.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(Provision),
            Box::new(InstallDependencies),
            Box::new(MaterializeSource),
            Box::new(CollectStatic),
        ])
    }

    pub fn steps(&self) -> impl Iterator<Item = &dyn BuildStep> {
        self.steps.iter().map(|s| s.as_ref())
    }

    /// Run every step in order.
    ///
    /// The ledger is cleared first and each layer is recorded as soon as its
    /// step succeeds. The first failure stops the pipeline: the build moves to
    /// `BuildFailed`, no later step runs and no later layer is recorded. The
    /// failing step's error is returned unchanged.
    pub async fn run(
        &self,
        ctx: &mut BuildContext<'_>,
        layers: &mut dyn LayerStore,
    ) -> Result<BuildReport> {
        layers.clear()?;

        let mut state = BuildState::Pending;
        let mut parent: Option<String> = None;

        for step in self.steps.iter() {
            // Reject out-of-order steps before they touch anything.
            let next = state.advance(step.target())?;
            info!(step = step.name(), from = %state, to = %next, "running build step");

            match step.run(ctx).await {
                Ok(content) => {
                    state = next;
                    let digest = chain_digest(parent.as_deref(), &content);
                    layers.record(LayerRecord {
                        state,
                        digest: digest.clone(),
                    })?;
                    parent = Some(digest);
                }
                Err(err) => {
                    let failed_from = state;
                    state = state.fail()?;
                    error!(
                        step = step.name(),
                        from = %failed_from,
                        %state,
                        error = %err,
                        "build step failed; aborting build"
                    );
                    return Err(err);
                }
            }
        }

        let report = BuildReport {
            state,
            layers: layers.load()?,
        };
        info!(
            %state,
            digest = report.image_digest().unwrap_or(""),
            "build complete"
        );
        Ok(report)
    }
}
