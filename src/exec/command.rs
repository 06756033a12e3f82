// src/exec/command.rs

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::types::ProcessEnv;

/// A single external command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Name of the step issuing the command, used to tag log lines.
    pub step: String,
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: ProcessEnv,
    /// Kill the command if it runs longer than this.
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    pub fn new(step: impl Into<String>, program: impl Into<String>, cwd: PathBuf) -> Self {
        Self {
            step: step.into(),
            program: program.into(),
            args: Vec::new(),
            cwd,
            env: ProcessEnv::default(),
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, env: ProcessEnv) -> Self {
        self.env = env;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Program followed by its arguments.
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .argv()
            .into_iter()
            .map(|a| {
                if a.is_empty() || a.contains(char::is_whitespace) {
                    format!("'{a}'")
                } else {
                    a.to_string()
                }
            })
            .collect();
        f.write_str(&rendered.join(" "))
    }
}

/// How a command finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Success,
    /// Non-zero exit; `-1` when the process was killed by a signal.
    Failed(i32),
    TimedOut,
}

impl CommandOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, CommandOutcome::Success)
    }
}
