// src/config/validate.rs

use std::net::IpAddr;

use globset::Glob;

use crate::config::model::{
    AssetsConfig, ConfigFile, ImageConfig, RawConfigFile, RuntimeConfig, ServerConfig,
};
use crate::errors::{LaunchpadError, Result};
use crate::types::{EntryPoint, EnvironmentFlags, ServerBinding, parse_duration};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = LaunchpadError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_build(&raw)?;
        let runtime = validate_runtime(&raw)?;
        validate_dependencies(&raw)?;
        let assets = validate_assets(&raw)?;
        let server = validate_server(&raw)?;

        let image = ImageConfig {
            base: raw
                .image
                .base
                .clone()
                .unwrap_or_else(|| format!("python:{}", runtime.version)),
            workdir: raw.image.workdir.clone(),
        };
        if !image.workdir.starts_with('/') {
            return Err(config_error(format!(
                "[image].workdir must be an absolute path (got '{}')",
                image.workdir
            )));
        }

        Ok(ConfigFile {
            build: raw.build,
            runtime,
            dependencies: raw.dependencies,
            assets,
            server,
            image,
        })
    }
}

fn config_error(msg: impl Into<String>) -> LaunchpadError {
    LaunchpadError::ConfigError(msg.into())
}

fn validate_build(cfg: &RawConfigFile) -> Result<()> {
    let workdir = &cfg.build.workdir;
    if workdir.as_os_str().is_empty() || workdir.as_os_str() == "." {
        return Err(config_error(
            "[build].workdir must name a dedicated directory, not the config root",
        ));
    }
    if cfg.build.state_dir.as_os_str().is_empty() {
        return Err(config_error("[build].state_dir must not be empty"));
    }

    for pat in cfg.build.exclude.iter() {
        Glob::new(pat)
            .map_err(|e| config_error(format!("invalid [build].exclude pattern '{pat}': {e}")))?;
    }
    Ok(())
}

fn validate_runtime(cfg: &RawConfigFile) -> Result<RuntimeConfig> {
    let version = cfg.runtime.version.trim();
    let well_formed = !version.is_empty()
        && version.split('.').count() <= 3
        && version
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
    if !well_formed {
        return Err(config_error(format!(
            "[runtime].version must look like '3.11' (got '{}')",
            cfg.runtime.version
        )));
    }

    let python = match cfg.runtime.python.as_deref().map(str::trim) {
        Some("") => return Err(config_error("[runtime].python must not be empty")),
        Some(p) => p.to_string(),
        None => format!("python{version}"),
    };

    Ok(RuntimeConfig {
        version: version.to_string(),
        python,
        flags: EnvironmentFlags {
            disable_bytecode_cache: cfg.runtime.disable_bytecode_cache,
            disable_output_buffering: cfg.runtime.disable_output_buffering,
        },
    })
}

fn validate_dependencies(cfg: &RawConfigFile) -> Result<()> {
    let manifest = &cfg.dependencies.manifest;
    if manifest.as_os_str().is_empty() {
        return Err(config_error("[dependencies].manifest must not be empty"));
    }
    if manifest.is_absolute() {
        return Err(config_error(format!(
            "[dependencies].manifest must be relative to [build].source (got {:?})",
            manifest
        )));
    }
    Ok(())
}

fn validate_assets(cfg: &RawConfigFile) -> Result<AssetsConfig> {
    let timeout = parse_duration(&cfg.assets.timeout)
        .map_err(|e| config_error(format!("invalid [assets].timeout: {e}")))?;
    if timeout.is_zero() {
        return Err(config_error("[assets].timeout must be greater than zero"));
    }
    if cfg.assets.static_root.is_absolute() || cfg.assets.manage.is_absolute() {
        return Err(config_error(
            "[assets].manage and [assets].static_root must be relative to [build].workdir",
        ));
    }

    Ok(AssetsConfig {
        manage: cfg.assets.manage.clone(),
        static_root: cfg.assets.static_root.clone(),
        timeout,
    })
}

fn validate_server(cfg: &RawConfigFile) -> Result<ServerConfig> {
    let server = &cfg.server;
    if server.program.trim().is_empty() {
        return Err(config_error("[server].program must not be empty"));
    }

    let host: IpAddr = server
        .host
        .trim()
        .parse()
        .map_err(|e| config_error(format!("invalid [server].host '{}': {e}", server.host)))?;
    if server.port == 0 {
        return Err(config_error("[server].port must be a fixed port (got 0)"));
    }

    let entry: EntryPoint = server
        .entry
        .parse()
        .map_err(|e: String| config_error(format!("invalid [server].entry: {e}")))?;

    let shutdown_grace = parse_duration(&server.shutdown_grace)
        .map_err(|e| config_error(format!("invalid [server].shutdown_grace: {e}")))?;

    Ok(ServerConfig {
        program: server.program.trim().to_string(),
        binding: ServerBinding {
            host,
            port: server.port,
        },
        entry,
        mode: server.mode,
        shutdown_grace,
    })
}
