// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::{EntryPoint, EnvironmentFlags, LaunchMode, ServerBinding};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [build]
/// source = "."
/// workdir = "build/app"
///
/// [runtime]
/// version = "3.11"
///
/// [dependencies]
/// manifest = "requirements.txt"
///
/// [server]
/// entry = "locations_data_apis.wsgi:application"
/// ```
///
/// All sections are optional and have defaults matching the reference
/// container recipe.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub build: BuildSection,

    #[serde(default)]
    pub runtime: RuntimeSection,

    #[serde(default)]
    pub dependencies: DependenciesSection,

    #[serde(default)]
    pub assets: AssetsSection,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub image: ImageSection,
}

/// `[build]` section: where the source lives and where it is materialised.
///
/// Relative paths are resolved against the directory holding the config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildSection {
    #[serde(default = "default_source")]
    pub source: PathBuf,

    #[serde(default = "default_workdir")]
    pub workdir: PathBuf,

    /// Holds the layer ledger. Must not live inside `workdir`.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    /// Glob patterns (relative to `source`) skipped by the materializer.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

fn default_source() -> PathBuf {
    PathBuf::from(".")
}

fn default_workdir() -> PathBuf {
    PathBuf::from("build/app")
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(".launchpad")
}

fn default_exclude() -> Vec<String> {
    vec![".git/**".to_string(), "**/__pycache__/**".to_string()]
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            source: default_source(),
            workdir: default_workdir(),
            state_dir: default_state_dir(),
            exclude: default_exclude(),
        }
    }
}

/// `[runtime]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeSection {
    /// Pinned interpreter version, e.g. `"3.11"`.
    #[serde(default = "default_runtime_version")]
    pub version: String,

    /// Explicit interpreter executable. Defaults to `python<version>`.
    #[serde(default)]
    pub python: Option<String>,

    #[serde(default = "default_true")]
    pub disable_bytecode_cache: bool,

    #[serde(default = "default_true")]
    pub disable_output_buffering: bool,
}

fn default_runtime_version() -> String {
    "3.11".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            version: default_runtime_version(),
            python: None,
            disable_bytecode_cache: true,
            disable_output_buffering: true,
        }
    }
}

/// `[dependencies]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependenciesSection {
    /// Manifest path, relative to `build.source`.
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,

    /// Reject requirements that are not pinned to an exact version.
    #[serde(default = "default_true")]
    pub require_pins: bool,
}

fn default_manifest() -> PathBuf {
    PathBuf::from("requirements.txt")
}

impl Default for DependenciesSection {
    fn default() -> Self {
        Self {
            manifest: default_manifest(),
            require_pins: true,
        }
    }
}

/// `[assets]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssetsSection {
    /// Management script, relative to the working directory.
    #[serde(default = "default_manage")]
    pub manage: PathBuf,

    /// Directory the collector writes into, relative to the working directory.
    #[serde(default = "default_static_root")]
    pub static_root: PathBuf,

    /// Upper bound for the collector, e.g. `"10m"`.
    #[serde(default = "default_assets_timeout")]
    pub timeout: String,
}

fn default_manage() -> PathBuf {
    PathBuf::from("manage.py")
}

fn default_static_root() -> PathBuf {
    PathBuf::from("staticfiles")
}

fn default_assets_timeout() -> String {
    "10m".to_string()
}

impl Default for AssetsSection {
    fn default() -> Self {
        Self {
            manage: default_manage(),
            static_root: default_static_root(),
            timeout: default_assets_timeout(),
        }
    }
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_server_program")]
    pub program: String,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// `module.path:attribute`.
    #[serde(default = "default_entry")]
    pub entry: String,

    #[serde(default)]
    pub mode: LaunchMode,

    /// How long a supervised server gets to exit after Ctrl-C.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace: String,
}

fn default_server_program() -> String {
    "gunicorn".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_entry() -> String {
    "locations_data_apis.wsgi:application".to_string()
}

fn default_shutdown_grace() -> String {
    "30s".to_string()
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            program: default_server_program(),
            host: default_host(),
            port: default_port(),
            entry: default_entry(),
            mode: LaunchMode::default(),
            shutdown_grace: default_shutdown_grace(),
        }
    }
}

/// `[image]` section, only used when rendering a container recipe.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageSection {
    /// Base image; defaults to `python:<runtime.version>`.
    #[serde(default)]
    pub base: Option<String>,

    #[serde(default = "default_image_workdir")]
    pub workdir: String,
}

fn default_image_workdir() -> String {
    "/app".to_string()
}

impl Default for ImageSection {
    fn default() -> Self {
        Self {
            base: None,
            workdir: default_image_workdir(),
        }
    }
}

/// Validated configuration.
///
/// Only constructed through `TryFrom<RawConfigFile>`, so the typed fields
/// (entry object, binding, durations) are always well-formed.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub build: BuildSection,
    pub runtime: RuntimeConfig,
    pub dependencies: DependenciesSection,
    pub assets: AssetsConfig,
    pub server: ServerConfig,
    pub image: ImageConfig,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub version: String,
    pub python: String,
    pub flags: EnvironmentFlags,
}

#[derive(Debug, Clone)]
pub struct AssetsConfig {
    pub manage: PathBuf,
    pub static_root: PathBuf,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub program: String,
    pub binding: ServerBinding,
    pub entry: EntryPoint,
    pub mode: LaunchMode,
    pub shutdown_grace: Duration,
}

#[derive(Debug, Clone)]
pub struct ImageConfig {
    pub base: String,
    pub workdir: String,
}
