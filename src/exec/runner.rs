// src/exec/runner.rs

//! Runs one build command to completion.

use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::exec::command::{CommandOutcome, CommandSpec};

/// Run `spec` with stdin closed, forwarding stdout/stderr line by line to the
/// log, and wait for it to exit (or time out).
///
/// Output readers are joined before returning, so every diagnostic line the
/// tool wrote is logged before the outcome is reported.
pub async fn run_command(spec: &CommandSpec) -> Result<CommandOutcome> {
    info!(step = %spec.step, cmd = %spec, cwd = ?spec.cwd, "starting command");

    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args)
        .current_dir(&spec.cwd)
        .envs(spec.env.vars().iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning '{}' for step '{}'", spec.program, spec.step))?;

    let readers = [
        child
            .stdout
            .take()
            .map(|out| forward_lines(spec.step.clone(), "stdout", out)),
        child
            .stderr
            .take()
            .map(|err| forward_lines(spec.step.clone(), "stderr", err)),
    ];

    let outcome = match spec.timeout {
        Some(limit) => {
            tokio::select! {
                status_res = child.wait() => {
                    let status = status_res
                        .with_context(|| format!("waiting for '{}'", spec.program))?;
                    outcome_from_status(status)
                }
                _ = tokio::time::sleep(limit) => {
                    warn!(
                        step = %spec.step,
                        timeout = ?limit,
                        "command exceeded its time limit; killing process"
                    );
                    if let Err(e) = child.kill().await {
                        warn!(step = %spec.step, error = %e, "failed to kill timed-out process");
                    }
                    CommandOutcome::TimedOut
                }
            }
        }
        None => {
            let status = child
                .wait()
                .await
                .with_context(|| format!("waiting for '{}'", spec.program))?;
            outcome_from_status(status)
        }
    };

    for reader in readers.into_iter().flatten() {
        // A killed command may leave descendants holding the pipes open.
        if outcome == CommandOutcome::TimedOut {
            reader.abort();
        }
        let _ = reader.await;
    }

    info!(step = %spec.step, outcome = ?outcome, "command finished");
    Ok(outcome)
}

fn outcome_from_status(status: std::process::ExitStatus) -> CommandOutcome {
    if status.success() {
        CommandOutcome::Success
    } else {
        CommandOutcome::Failed(status.code().unwrap_or(-1))
    }
}

fn forward_lines<R>(step: String, stream: &'static str, reader: R) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            info!(step = %step, stream, "{}", line);
        }
    })
}
