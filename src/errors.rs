// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LaunchpadError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Manifest error at line {line}: {message}")]
    Manifest { line: usize, message: String },

    #[error("Step '{step}' failed: {diagnostic}")]
    StepFailed {
        step: String,
        exit_code: Option<i32>,
        diagnostic: String,
    },

    #[error("Address {0} is already in use")]
    PortInUse(String),

    #[error("Server exited with status {0}")]
    ServerExited(i32),

    #[error("Incomplete build: {0}")]
    IncompleteBuild(String),

    #[error("Invalid build state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LaunchpadError {
    /// Process exit code to report for this error.
    ///
    /// Tool failures propagate the tool's own non-zero code; everything else
    /// maps to `1`.
    pub fn exit_code(&self) -> i32 {
        match self {
            LaunchpadError::StepFailed {
                exit_code: Some(code),
                ..
            } if *code != 0 => *code,
            LaunchpadError::ServerExited(code) if *code != 0 => *code,
            _ => 1,
        }
    }

    pub(crate) fn step_failed(
        step: impl Into<String>,
        exit_code: Option<i32>,
        diagnostic: impl Into<String>,
    ) -> Self {
        LaunchpadError::StepFailed {
            step: step.into(),
            exit_code,
            diagnostic: diagnostic.into(),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, LaunchpadError>;
