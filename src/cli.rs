// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `launchpad`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "launchpad",
    version,
    about = "Build and launch a Python web application the way its container recipe does.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Launchpad.toml` in the current working directory.
    #[arg(long, global = true, value_name = "PATH", default_value = "Launchpad.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `LAUNCHPAD_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum CliCommand {
    /// Provision, install dependencies, materialize source, collect static assets.
    Build,

    /// Launch the server from a completed build.
    Run,

    /// Build, then launch the server.
    Up,

    /// Parse + validate, print the resolved steps, but don't execute anything.
    Plan,

    /// Print the equivalent container build recipe.
    Dockerfile {
        /// Print a `.dockerignore` built from `[build].exclude` instead.
        #[arg(long)]
        ignore: bool,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
