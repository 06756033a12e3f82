#![cfg(unix)]

use std::path::PathBuf;
use std::time::{Duration, Instant};

use launchpad::exec::runner::run_command;
use launchpad::exec::{CommandBackend, CommandOutcome, CommandSpec, RealCommandBackend};
use launchpad::types::{EnvironmentFlags, ProcessEnv};
use launchpad_test_utils::{init_tracing, with_timeout};
use tempfile::tempdir;

fn sh(script: &str, cwd: PathBuf) -> CommandSpec {
    CommandSpec::new("test-step", "sh", cwd).args(["-c", script])
}

#[tokio::test]
async fn exit_status_maps_to_outcome() {
    init_tracing();
    let dir = tempdir().unwrap();

    let ok = with_timeout(run_command(&sh("echo hello; echo oops >&2", dir.path().into())))
        .await
        .unwrap();
    assert_eq!(ok, CommandOutcome::Success);

    let failed = with_timeout(run_command(&sh("exit 3", dir.path().into())))
        .await
        .unwrap();
    assert_eq!(failed, CommandOutcome::Failed(3));
    assert!(!failed.is_success());
}

#[tokio::test]
async fn slow_command_is_killed_at_its_timeout() {
    init_tracing();
    let dir = tempdir().unwrap();

    let spec = sh("sleep 30", dir.path().into()).timeout(Duration::from_millis(200));
    let started = Instant::now();
    let outcome = with_timeout(run_command(&spec)).await.unwrap();

    assert_eq!(outcome, CommandOutcome::TimedOut);
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn stdin_is_closed_so_prompts_cannot_block() {
    init_tracing();
    let dir = tempdir().unwrap();

    // `read` fails immediately on EOF instead of waiting for a terminal.
    let spec = sh("if read answer; then exit 7; else exit 0; fi", dir.path().into())
        .timeout(Duration::from_secs(3));
    let outcome = with_timeout(run_command(&spec)).await.unwrap();
    assert_eq!(outcome, CommandOutcome::Success);
}

#[tokio::test]
async fn commands_get_the_explicit_environment_and_working_directory() {
    init_tracing();
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("manage.py"), "").unwrap();

    let mut env = ProcessEnv::from_flags(&EnvironmentFlags::default());
    env.set("LAUNCHPAD_TEST_MARKER", "yes");

    let spec = sh(
        "test -f manage.py && test \"$PYTHONUNBUFFERED\" = 1 \
         && test \"$PYTHONDONTWRITEBYTECODE\" = 1 && test \"$LAUNCHPAD_TEST_MARKER\" = yes",
        dir.path().into(),
    )
    .env(env);

    let mut backend = RealCommandBackend::new();
    let outcome = with_timeout(backend.run(spec)).await.unwrap();
    assert_eq!(outcome, CommandOutcome::Success);
}

#[tokio::test]
async fn missing_program_is_an_error_not_an_outcome() {
    init_tracing();
    let dir = tempdir().unwrap();

    let spec = CommandSpec::new("test-step", "launchpad-no-such-program", dir.path().into());
    let mut backend = RealCommandBackend::new();
    assert!(with_timeout(backend.run(spec)).await.is_err());
}

#[test]
fn command_display_quotes_arguments_with_spaces() {
    let spec = sh("exit 0", PathBuf::from("/tmp"));
    assert_eq!(spec.to_string(), "sh -c 'exit 0'");
    assert_eq!(spec.argv(), vec!["sh", "-c", "exit 0"]);
}
