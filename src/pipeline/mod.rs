// src/pipeline/mod.rs

//! Build-time workflow.
//!
//! This module ties together:
//! - the linear build state machine (`state`)
//! - the step abstraction and its shared context (`step`)
//! - the four concrete steps (`steps`)
//! - the fail-fast runner (`runner`)
//! - the ledger of completed layers (`layers`)

pub mod layers;
pub mod runner;
pub mod state;
pub mod step;
pub mod steps;

pub use layers::{FileLayerStore, LayerRecord, LayerStore, MemoryLayerStore};
pub use runner::{BuildReport, Pipeline};
pub use state::BuildState;
pub use step::{BuildContext, BuildStep, StepFuture};
