// src/config/mod.rs

//! Configuration loading and validation for launchpad.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Turn the raw model into a validated `ConfigFile` (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{config_root_dir, load_and_validate, load_from_path};
pub use model::{
    AssetsConfig, AssetsSection, BuildSection, ConfigFile, DependenciesSection, ImageConfig,
    ImageSection, RawConfigFile, RuntimeConfig, RuntimeSection, ServerConfig, ServerSection,
};
