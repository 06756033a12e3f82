use std::net::{Ipv4Addr, TcpListener};
use std::path::PathBuf;
use std::time::Duration;

use launchpad::errors::LaunchpadError;
use launchpad::exec::{CommandSpec, LaunchSpec, check_port_available, launch};
use launchpad::pipeline::BuildState;
use launchpad::types::{LaunchMode, ServerBinding};
use launchpad_test_utils::{init_tracing, with_timeout};

fn loopback(port: u16) -> ServerBinding {
    ServerBinding {
        host: Ipv4Addr::LOCALHOST.into(),
        port,
    }
}

fn free_port() -> u16 {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    listener.local_addr().unwrap().port()
}

fn supervised(program: &str, args: &[&str], binding: ServerBinding) -> LaunchSpec {
    LaunchSpec {
        command: CommandSpec::new("launch", program, std::env::temp_dir()).args(args.iter().copied()),
        binding,
        mode: LaunchMode::Supervise,
        shutdown_grace: Duration::from_secs(1),
    }
}

#[test]
fn bound_port_is_reported_as_in_use() {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    let binding = loopback(listener.local_addr().unwrap().port());

    match check_port_available(&binding) {
        Err(LaunchpadError::PortInUse(addr)) => assert_eq!(addr, binding.to_string()),
        other => panic!("Expected PortInUse, got: {:?}", other),
    }

    drop(listener);
    assert!(check_port_available(&binding).is_ok());
}

#[tokio::test]
async fn launch_refuses_an_occupied_port_without_spawning() {
    init_tracing();
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    let binding = loopback(listener.local_addr().unwrap().port());

    let spec = supervised("launchpad-no-such-program", &[], binding);
    let result = with_timeout(launch(&spec, BuildState::AssetsCollected)).await;
    assert!(matches!(result, Err(LaunchpadError::PortInUse(_))), "{result:?}");
    assert_eq!(result.unwrap_err().exit_code(), 1);
}

#[tokio::test]
async fn launch_requires_collected_assets() {
    init_tracing();
    let spec = supervised("true", &[], loopback(free_port()));

    let result = with_timeout(launch(&spec, BuildState::SourceMaterialized)).await;
    assert!(
        matches!(result, Err(LaunchpadError::InvalidTransition { .. })),
        "{result:?}"
    );
}

#[cfg(unix)]
#[tokio::test]
async fn supervised_server_exit_status_is_propagated() {
    init_tracing();

    let ok = supervised("sh", &["-c", "exit 0"], loopback(free_port()));
    assert!(with_timeout(launch(&ok, BuildState::AssetsCollected)).await.is_ok());

    let failing = supervised("sh", &["-c", "exit 4"], loopback(free_port()));
    match with_timeout(launch(&failing, BuildState::AssetsCollected)).await {
        Err(err @ LaunchpadError::ServerExited(4)) => assert_eq!(err.exit_code(), 4),
        other => panic!("Expected ServerExited(4), got: {:?}", other),
    }
}

#[cfg(unix)]
#[test]
fn signal_deaths_map_to_128_plus_signal() {
    use launchpad::exec::launch::exit_code_of;

    let status = std::process::Command::new("sh")
        .args(["-c", "kill -9 $$"])
        .current_dir(PathBuf::from("/"))
        .status()
        .unwrap();
    assert_eq!(exit_code_of(status), 137);
}
