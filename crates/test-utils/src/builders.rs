#![allow(dead_code)]

use std::path::{Path, PathBuf};

use launchpad::config::{ConfigFile, RawConfigFile};
use launchpad::fs::mock::MockFileSystem;
use launchpad::types::LaunchMode;

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the same defaults as an empty `Launchpad.toml`, except that
/// the interpreter is pinned to a plain `python3` and the launcher
/// supervises instead of exec'ing.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        let mut config = RawConfigFile::default();
        config.runtime.python = Some("python3".to_string());
        config.server.mode = LaunchMode::Supervise;
        Self { config }
    }

    pub fn source(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.build.source = path.into();
        self
    }

    pub fn workdir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.build.workdir = path.into();
        self
    }

    pub fn state_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.build.state_dir = path.into();
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.config.build.exclude.push(pattern.to_string());
        self
    }

    pub fn no_excludes(mut self) -> Self {
        self.config.build.exclude.clear();
        self
    }

    pub fn python(mut self, python: &str) -> Self {
        self.config.runtime.python = Some(python.to_string());
        self
    }

    pub fn runtime_version(mut self, version: &str) -> Self {
        self.config.runtime.version = version.to_string();
        self
    }

    pub fn flags(mut self, disable_bytecode_cache: bool, disable_output_buffering: bool) -> Self {
        self.config.runtime.disable_bytecode_cache = disable_bytecode_cache;
        self.config.runtime.disable_output_buffering = disable_output_buffering;
        self
    }

    pub fn manifest(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.dependencies.manifest = path.into();
        self
    }

    pub fn require_pins(mut self, val: bool) -> Self {
        self.config.dependencies.require_pins = val;
        self
    }

    pub fn static_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.assets.static_root = path.into();
        self
    }

    pub fn assets_timeout(mut self, timeout: &str) -> Self {
        self.config.assets.timeout = timeout.to_string();
        self
    }

    pub fn server_program(mut self, program: &str) -> Self {
        self.config.server.program = program.to_string();
        self
    }

    pub fn bind(mut self, host: &str, port: u16) -> Self {
        self.config.server.host = host.to_string();
        self.config.server.port = port;
        self
    }

    pub fn entry(mut self, entry: &str) -> Self {
        self.config.server.entry = entry.to_string();
        self
    }

    pub fn mode(mut self, mode: LaunchMode) -> Self {
        self.config.server.mode = mode;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Requirements used by most fixtures.
pub const DEFAULT_REQUIREMENTS: &str = "django==4.2\ngunicorn==21.2\n";

/// Populate `fs` with a minimal web project rooted at `root`.
pub fn mock_project(fs: &MockFileSystem, root: &Path, requirements: &str) {
    fs.add_file(root.join("requirements.txt"), requirements);
    fs.add_file(root.join("manage.py"), "#!/usr/bin/env python\n");
    fs.add_file(root.join("locations_data_apis/__init__.py"), "");
    fs.add_file(root.join("locations_data_apis/wsgi.py"), "application = None\n");
    fs.add_file(root.join("locations/views.py"), "# views\n");
    fs.add_file(root.join("locations/static/locations/site.css"), "body {}\n");
}
