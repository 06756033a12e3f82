// src/lib.rs

pub mod cli;
pub mod config;
pub mod dockerfile;
pub mod errors;
pub mod exec;
pub mod fingerprint;
pub mod fs;
pub mod logging;
pub mod manifest;
pub mod pipeline;
pub mod plan;
pub mod types;

use std::path::PathBuf;

use tracing::{debug, info};

use crate::cli::{CliArgs, CliCommand};
use crate::config::{config_root_dir, load_and_validate};
use crate::errors::{LaunchpadError, Result};
use crate::exec::{RealCommandBackend, launch};
use crate::fs::RealFileSystem;
use crate::pipeline::{BuildContext, BuildReport, BuildState, FileLayerStore, LayerStore, Pipeline};
use crate::plan::BuildPlan;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and plan resolution
/// - the build pipeline (real filesystem, real processes, on-disk ledger)
/// - the server launcher
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    if let CliCommand::Dockerfile { ignore } = args.command {
        if ignore {
            print!("{}", dockerfile::render_dockerignore(&cfg));
        } else {
            print!("{}", dockerfile::render_dockerfile(&cfg));
        }
        return Ok(());
    }

    let plan = BuildPlan::resolve(&cfg, &config_root_dir(&config_path))?;

    match args.command {
        CliCommand::Plan => {
            print_plan(&plan, &Pipeline::standard());
            Ok(())
        }
        CliCommand::Build => build(&plan).await.map(|_| ()),
        CliCommand::Run => run_server(&plan).await,
        CliCommand::Up => {
            let report = build(&plan).await?;
            launch(&plan.launch_spec(), report.state).await
        }
        CliCommand::Dockerfile { .. } => Ok(()),
    }
}

/// Run the four build steps against the real filesystem.
pub async fn build(plan: &BuildPlan) -> Result<BuildReport> {
    let fs = RealFileSystem;
    let mut backend = RealCommandBackend::new();
    let mut layers = FileLayerStore::new(plan.state_dir.clone());

    let mut ctx = BuildContext {
        plan,
        fs: &fs,
        backend: &mut backend,
    };
    Pipeline::standard().run(&mut ctx, &mut layers).await
}

/// Launch the server, provided the ledger records a completed build.
pub async fn run_server(plan: &BuildPlan) -> Result<()> {
    let layers = FileLayerStore::new(plan.state_dir.clone());
    if !layers.is_complete()? {
        return Err(LaunchpadError::IncompleteBuild(format!(
            "no completed build recorded in {:?}; run `launchpad build` first",
            layers.path()
        )));
    }
    info!(ledger = ?layers.path(), "found completed build");

    launch(&plan.launch_spec(), BuildState::AssetsCollected).await
}

/// Dry-run output: print paths, environment, steps and commands.
fn print_plan(plan: &BuildPlan, pipeline: &Pipeline) {
    println!("launchpad plan");
    println!("  source    = {}", plan.source_dir.display());
    println!("  workdir   = {}", plan.workdir.display());
    println!("  state_dir = {}", plan.state_dir.display());
    println!("  runtime   = {} ({})", plan.config.runtime.version, plan.python());
    for (key, value) in plan.env.vars() {
        println!("  env       {key}={value}");
    }
    println!();

    println!("build steps:");
    for (idx, step) in pipeline.steps().enumerate() {
        println!("  {}. {} -> {}", idx + 1, step.name(), step.target());
        for cmd in step.commands(plan) {
            println!("      cmd: {cmd}");
            if let Some(timeout) = cmd.timeout {
                println!("      timeout: {timeout:?}");
            }
        }
    }
    println!();

    let launch = plan.launch_spec();
    println!("launch ({}):", launch.mode);
    println!("  bind: {}", launch.binding);
    println!("  cmd: {}", launch.command);

    debug!("plan complete (no execution)");
}
