// src/plan.rs

//! Resolved build plan: a validated config with absolute paths and the
//! exact commands each step will run.

use std::path::{Component, Path, PathBuf};

use crate::config::ConfigFile;
use crate::errors::{LaunchpadError, Result};
use crate::exec::{CommandSpec, LaunchSpec};
use crate::types::ProcessEnv;

/// Step names, used to tag logs and errors.
pub const STEP_PROVISION: &str = "provision";
pub const STEP_INSTALL: &str = "install-dependencies";
pub const STEP_MATERIALIZE: &str = "materialize-source";
pub const STEP_COLLECT_STATIC: &str = "collect-static";
pub const STEP_LAUNCH: &str = "launch";

#[derive(Debug, Clone)]
pub struct BuildPlan {
    pub config: ConfigFile,
    pub source_dir: PathBuf,
    pub workdir: PathBuf,
    pub state_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub static_root: PathBuf,
    /// Environment every child process receives.
    pub env: ProcessEnv,
}

impl BuildPlan {
    /// Resolve `cfg` against `root` (normally the config file's directory).
    pub fn resolve(cfg: &ConfigFile, root: &Path) -> Result<BuildPlan> {
        let root = if root.is_absolute() {
            normalize(root)
        } else {
            let cwd = std::env::current_dir()?;
            normalize(&cwd.join(root))
        };

        let source_dir = normalize(&root.join(&cfg.build.source));
        let workdir = normalize(&root.join(&cfg.build.workdir));
        let state_dir = normalize(&root.join(&cfg.build.state_dir));

        if source_dir.starts_with(&workdir) {
            return Err(LaunchpadError::ConfigError(format!(
                "[build].workdir {:?} must not be (or contain) the source directory {:?}",
                workdir, source_dir
            )));
        }
        if state_dir.starts_with(&workdir) {
            return Err(LaunchpadError::ConfigError(format!(
                "[build].state_dir {:?} must not live inside [build].workdir {:?}",
                state_dir, workdir
            )));
        }

        let manifest_path = normalize(&source_dir.join(&cfg.dependencies.manifest));
        let static_root = normalize(&workdir.join(&cfg.assets.static_root));
        if !static_root.starts_with(&workdir) {
            return Err(LaunchpadError::ConfigError(format!(
                "[assets].static_root {:?} escapes the working directory",
                cfg.assets.static_root
            )));
        }

        Ok(BuildPlan {
            config: cfg.clone(),
            source_dir,
            workdir,
            state_dir,
            manifest_path,
            static_root,
            env: ProcessEnv::from_flags(&cfg.runtime.flags),
        })
    }

    pub fn python(&self) -> &str {
        &self.config.runtime.python
    }

    /// `<python> -m pip install --no-cache-dir -r <manifest>`, run from the
    /// source directory.
    pub fn install_command(&self) -> CommandSpec {
        CommandSpec::new(STEP_INSTALL, self.python(), self.source_dir.clone())
            .args(["-m", "pip", "install", "--no-cache-dir", "-r"])
            .arg(self.manifest_path.to_string_lossy())
            .env(self.env.clone())
    }

    /// `<python> manage.py collectstatic --noinput`, run from the working
    /// directory and bounded by the assets timeout.
    pub fn collect_static_command(&self) -> CommandSpec {
        CommandSpec::new(STEP_COLLECT_STATIC, self.python(), self.workdir.clone())
            .arg(self.config.assets.manage.to_string_lossy())
            .args(["collectstatic", "--noinput"])
            .env(self.env.clone())
            .timeout(self.config.assets.timeout)
    }

    /// `<server> --bind <host>:<port> <module>:<attribute>`.
    pub fn launch_spec(&self) -> LaunchSpec {
        let server = &self.config.server;
        let command = CommandSpec::new(STEP_LAUNCH, server.program.clone(), self.workdir.clone())
            .arg("--bind")
            .arg(server.binding.to_string())
            .arg(server.entry.to_string())
            .env(self.env.clone());

        LaunchSpec {
            command,
            binding: server.binding,
            mode: server.mode,
            shutdown_grace: server.shutdown_grace,
        }
    }
}

/// Lexically normalise a path: drop `.` and fold `..` where possible.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}
