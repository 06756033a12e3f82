// src/pipeline/steps.rs

//! The four build-time steps, in workflow order.

use std::path::{Path, PathBuf};

use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, info};

use crate::errors::{LaunchpadError, Result};
use crate::exec::CommandSpec;
use crate::fingerprint::{compute_file_hash, compute_tree_hash, digest_str};
use crate::fs::FileSystem;
use crate::manifest::load_manifest;
use crate::pipeline::state::BuildState;
use crate::pipeline::step::{BuildContext, BuildStep, StepFuture, ensure_success};
use crate::plan::{
    BuildPlan, STEP_COLLECT_STATIC, STEP_INSTALL, STEP_MATERIALIZE, STEP_PROVISION,
};

/// Base environment provisioner.
///
/// Pure declaration: fixes the interpreter and the process environment. It
/// has no failure path.
pub struct Provision;

impl BuildStep for Provision {
    fn name(&self) -> &'static str {
        STEP_PROVISION
    }

    fn target(&self) -> BuildState {
        BuildState::Provisioned
    }

    fn run<'a, 'ctx>(&'a self, ctx: &'a mut BuildContext<'ctx>) -> StepFuture<'a>
    where
        'ctx: 'a,
    {
        Box::pin(async move {
            let plan = ctx.plan;
            let runtime = &plan.config.runtime;

            let mut rendered = format!("version={}\npython={}\n", runtime.version, runtime.python);
            for (key, value) in plan.env.vars() {
                rendered.push_str(&format!("{key}={value}\n"));
            }

            info!(
                version = %runtime.version,
                python = %runtime.python,
                env = ?plan.env.vars(),
                "provisioned runtime environment"
            );
            Ok(digest_str(&rendered))
        })
    }
}

/// Installs every manifest entry at its pinned version, without the
/// installer's local cache.
pub struct InstallDependencies;

impl BuildStep for InstallDependencies {
    fn name(&self) -> &'static str {
        STEP_INSTALL
    }

    fn target(&self) -> BuildState {
        BuildState::DependenciesInstalled
    }

    fn commands(&self, plan: &BuildPlan) -> Vec<CommandSpec> {
        vec![plan.install_command()]
    }

    fn run<'a, 'ctx>(&'a self, ctx: &'a mut BuildContext<'ctx>) -> StepFuture<'a>
    where
        'ctx: 'a,
    {
        Box::pin(async move {
            let plan = ctx.plan;
            let manifest = load_manifest(ctx.fs, &plan.manifest_path)?;
            manifest.check_pins(plan.config.dependencies.require_pins)?;

            for req in manifest.entries.iter() {
                debug!(requirement = %req, "declared dependency");
            }
            info!(
                manifest = ?plan.manifest_path,
                requirements = manifest.len(),
                "installing dependencies"
            );

            let spec = plan.install_command();
            let outcome = ctx.backend.run(spec.clone()).await?;
            ensure_success(&spec, outcome)?;

            Ok(compute_file_hash(ctx.fs, &plan.manifest_path)?)
        })
    }
}

/// Copies the project tree into a freshly emptied working directory.
pub struct MaterializeSource;

impl BuildStep for MaterializeSource {
    fn name(&self) -> &'static str {
        STEP_MATERIALIZE
    }

    fn target(&self) -> BuildState {
        BuildState::SourceMaterialized
    }

    fn run<'a, 'ctx>(&'a self, ctx: &'a mut BuildContext<'ctx>) -> StepFuture<'a>
    where
        'ctx: 'a,
    {
        Box::pin(async move {
            let plan = ctx.plan;
            let excludes = build_globset(&plan.config.build.exclude)?;
            let skip = [plan.workdir.clone(), plan.state_dir.clone()];

            let copied = materialize_tree(ctx.fs, &plan.source_dir, &plan.workdir, &excludes, &skip)
                .map_err(|e| match e {
                    LaunchpadError::Other(err) => {
                        LaunchpadError::step_failed(STEP_MATERIALIZE, None, format!("{err:#}"))
                    }
                    other => other,
                })?;
            info!(
                source = ?plan.source_dir,
                workdir = ?plan.workdir,
                files = copied,
                "materialized source tree"
            );

            Ok(compute_tree_hash(ctx.fs, &plan.workdir)?)
        })
    }
}

/// Runs the framework's asset collector non-interactively.
pub struct CollectStatic;

impl BuildStep for CollectStatic {
    fn name(&self) -> &'static str {
        STEP_COLLECT_STATIC
    }

    fn target(&self) -> BuildState {
        BuildState::AssetsCollected
    }

    fn commands(&self, plan: &BuildPlan) -> Vec<CommandSpec> {
        vec![plan.collect_static_command()]
    }

    fn run<'a, 'ctx>(&'a self, ctx: &'a mut BuildContext<'ctx>) -> StepFuture<'a>
    where
        'ctx: 'a,
    {
        Box::pin(async move {
            let plan = ctx.plan;
            let manage = plan.workdir.join(&plan.config.assets.manage);
            if !ctx.fs.is_file(&manage) {
                return Err(LaunchpadError::step_failed(
                    STEP_COLLECT_STATIC,
                    None,
                    format!("management script {:?} not found in working directory", manage),
                ));
            }

            let spec = plan.collect_static_command();
            let outcome = ctx.backend.run(spec.clone()).await?;
            ensure_success(&spec, outcome)?;

            info!(static_root = ?plan.static_root, "collected static assets");
            Ok(compute_tree_hash(ctx.fs, &plan.static_root)?)
        })
    }
}

/// Build a GlobSet from simple string patterns.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build().context("building exclude globset")?)
}

/// Replace the contents of `dest` with a copy of `source`.
///
/// - `excludes` is matched against `/`-separated paths relative to
///   `source`; a directory is pruned when either `dir` or `dir/` matches.
/// - Paths in `skip` are never descended into (the destination itself may
///   live inside the source tree). Their ancestors are walked, but only
///   reappear in `dest` if they hold copied files.
///
/// Returns the number of files copied.
pub fn materialize_tree(
    fs: &dyn FileSystem,
    source: &Path,
    dest: &Path,
    excludes: &GlobSet,
    skip: &[PathBuf],
) -> Result<usize> {
    if !fs.is_dir(source) {
        return Err(LaunchpadError::step_failed(
            STEP_MATERIALIZE,
            None,
            format!("source directory {:?} does not exist", source),
        ));
    }

    fs.remove_dir_all(dest)?;
    fs.create_dir_all(dest)?;

    let mut copied = 0;
    let mut stack = vec![source.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            if skip.iter().any(|s| s == &path) {
                debug!(path = ?path, "skipping build output directory");
                continue;
            }
            let Ok(rel) = path.strip_prefix(source) else {
                continue;
            };
            let rel_str = rel.to_string_lossy().replace('\\', "/");
            let target = dest.join(rel);

            if fs.is_dir(&path) {
                if excludes.is_match(&rel_str) || excludes.is_match(format!("{rel_str}/")) {
                    debug!(path = %rel_str, "excluded directory");
                    continue;
                }
                // A parent of the output directory is only recreated when a
                // file lands in it.
                if !skip.iter().any(|s| s.starts_with(&path)) {
                    fs.create_dir_all(&target)?;
                }
                stack.push(path);
            } else if fs.is_file(&path) {
                if excludes.is_match(&rel_str) {
                    debug!(path = %rel_str, "excluded file");
                    continue;
                }
                fs.copy(&path, &target)?;
                copied += 1;
            }
        }
    }

    Ok(copied)
}
