// src/exec/launch.rs

//! Run-time process launcher.
//!
//! Starts exactly one server process bound to the configured address. In
//! `exec` mode the launchpad process is replaced by the server; in
//! `supervise` mode the server runs as a child and its exit status is
//! propagated.

use std::io::ErrorKind;
use std::net::TcpListener;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use anyhow::Context;
use tokio::process::{Child, Command};
use tracing::{info, warn};

use crate::errors::{LaunchpadError, Result};
use crate::exec::command::CommandSpec;
use crate::pipeline::state::BuildState;
use crate::types::{LaunchMode, ServerBinding};

/// Everything needed to start the server.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    pub command: CommandSpec,
    pub binding: ServerBinding,
    pub mode: LaunchMode,
    pub shutdown_grace: Duration,
}

/// Fail fast with `PortInUse` if something already listens on `binding`.
///
/// The probe socket is closed again immediately; the server still reports
/// its own bind failure if it loses a race for the port.
pub fn check_port_available(binding: &ServerBinding) -> Result<()> {
    match TcpListener::bind(binding.socket_addr()) {
        Ok(listener) => {
            drop(listener);
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::AddrInUse => {
            Err(LaunchpadError::PortInUse(binding.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Start the server from a build that reached `from`.
///
/// Returns `Ok(())` only after a supervised server exited with status 0.
/// In `exec` mode this function does not return on success.
pub async fn launch(spec: &LaunchSpec, from: BuildState) -> Result<()> {
    let state = from.advance(BuildState::Listening)?;
    check_port_available(&spec.binding)?;

    info!(
        %state,
        bind = %spec.binding,
        mode = %spec.mode,
        cmd = %spec.command,
        "launching server"
    );

    match spec.mode {
        #[cfg(unix)]
        LaunchMode::Exec => exec_server(&spec.command),
        _ => supervise(spec).await,
    }
}

#[cfg(unix)]
fn exec_server(command: &CommandSpec) -> Result<()> {
    use std::os::unix::process::CommandExt;

    let err = std::process::Command::new(&command.program)
        .args(&command.args)
        .current_dir(&command.cwd)
        .envs(command.env.vars().iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .exec();

    // `exec` only returns on failure.
    Err(anyhow::Error::new(err)
        .context(format!("exec '{}'", command.program))
        .into())
}

async fn supervise(spec: &LaunchSpec) -> Result<()> {
    let command = &spec.command;
    let mut child = Command::new(&command.program)
        .args(&command.args)
        .current_dir(&command.cwd)
        .envs(command.env.vars().iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("spawning server '{}'", command.program))?;

    info!(pid = ?child.id(), bind = %spec.binding, "server process started");

    let status = tokio::select! {
        status_res = child.wait() => {
            status_res.context("waiting for server process")?
        }
        request = shutdown_signal() => {
            // Signals sent to launchpad alone never reach the server, so pass
            // the request on before waiting out the grace period.
            forward_signal(&child, request);
            info!(?request, grace = ?spec.shutdown_grace, "shutdown requested; waiting for server to exit");
            match tokio::time::timeout(spec.shutdown_grace, child.wait()).await {
                Ok(status_res) => status_res.context("waiting for server process")?,
                Err(_) => {
                    warn!("server did not exit within the grace period; killing it");
                    if let Err(e) = child.kill().await {
                        warn!(error = %e, "failed to kill server process");
                    }
                    child.wait().await.context("waiting for killed server process")?
                }
            }
        }
    };

    let code = exit_code_of(status);
    info!(exit_code = code, "server process exited");
    if code == 0 {
        Ok(())
    } else {
        Err(LaunchpadError::ServerExited(code))
    }
}

/// Which signal asked launchpad to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShutdownRequest {
    Interrupt,
    Terminate,
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM. A listener that cannot be
/// installed never resolves.
async fn shutdown_signal() -> ShutdownRequest {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => ShutdownRequest::Interrupt,
        _ = terminate => ShutdownRequest::Terminate,
    }
}

#[cfg(unix)]
fn forward_signal(child: &Child, request: ShutdownRequest) {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return;
    };
    let signal = match request {
        ShutdownRequest::Interrupt => Signal::SIGINT,
        ShutdownRequest::Terminate => Signal::SIGTERM,
    };
    if let Err(e) = kill(Pid::from_raw(pid as i32), signal) {
        warn!(pid, ?signal, error = %e, "failed to forward signal to server process");
    }
}

// Console Ctrl-C already reaches every process attached to the console.
#[cfg(not(unix))]
fn forward_signal(_child: &Child, _request: ShutdownRequest) {}

/// Exit code, or `128 + signal` when the process was killed by a signal.
pub fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}
