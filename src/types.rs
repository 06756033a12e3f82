// src/types.rs

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// Environment variable that stops the interpreter writing `.pyc` files.
pub const BYTECODE_CACHE_VAR: &str = "PYTHONDONTWRITEBYTECODE";

/// Environment variable that disables stdout/stderr buffering.
pub const OUTPUT_BUFFERING_VAR: &str = "PYTHONUNBUFFERED";

/// Process-wide runtime switches, fixed once the config is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvironmentFlags {
    pub disable_bytecode_cache: bool,
    pub disable_output_buffering: bool,
}

impl Default for EnvironmentFlags {
    fn default() -> Self {
        Self {
            disable_bytecode_cache: true,
            disable_output_buffering: true,
        }
    }
}

impl EnvironmentFlags {
    /// Render the enabled flags as `(name, value)` pairs, in a stable order.
    pub fn to_env(&self) -> Vec<(String, String)> {
        let mut vars = Vec::new();
        if self.disable_bytecode_cache {
            vars.push((BYTECODE_CACHE_VAR.to_string(), "1".to_string()));
        }
        if self.disable_output_buffering {
            vars.push((OUTPUT_BUFFERING_VAR.to_string(), "1".to_string()));
        }
        vars
    }
}

/// Explicit environment handed to every child process.
///
/// Built once by the provisioner; commands never read or mutate the
/// launchpad process's own environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessEnv {
    vars: Vec<(String, String)>,
}

impl ProcessEnv {
    pub fn from_flags(flags: &EnvironmentFlags) -> Self {
        Self {
            vars: flags.to_env(),
        }
    }

    /// Add or replace a variable.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.vars.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.vars.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn vars(&self) -> &[(String, String)] {
        &self.vars
    }
}

/// Host/port the launched server listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerBinding {
    pub host: IpAddr,
    pub port: u16,
}

impl Default for ServerBinding {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8000,
        }
    }
}

impl ServerBinding {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl fmt::Display for ServerBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.socket_addr())
    }
}

/// Reference to the application object the server delegates requests to,
/// written as `module.path:attribute`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    pub module: String,
    pub attribute: String,
}

impl FromStr for EntryPoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (module, attribute) = s
            .split_once(':')
            .ok_or_else(|| format!("entry object '{s}' must look like 'module.path:attribute'"))?;

        let is_ident = |part: &str| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
                && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        };

        if module.is_empty() || !module.split('.').all(is_ident) {
            return Err(format!("invalid module path '{module}' in entry object '{s}'"));
        }
        if !is_ident(attribute) {
            return Err(format!("invalid attribute '{attribute}' in entry object '{s}'"));
        }

        Ok(EntryPoint {
            module: module.to_string(),
            attribute: attribute.to_string(),
        })
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.attribute)
    }
}

/// How the server process is started.
///
/// - `Exec`: replace the launchpad process with the server (Unix only;
///   other platforms fall back to `Supervise`).
/// - `Supervise`: spawn the server as a child, wait for it and propagate its
///   exit status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaunchMode {
    #[default]
    Exec,
    Supervise,
}

impl fmt::Display for LaunchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchMode::Exec => f.write_str("exec"),
            LaunchMode::Supervise => f.write_str("supervise"),
        }
    }
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"10m"`, `"2h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let scale: u64 = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };

    value
        .checked_mul(scale)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{s}' is too large"))
}
