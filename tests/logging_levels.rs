use launchpad::cli::LogLevel;
use launchpad::logging::resolve_level;
use tracing::Level;

#[test]
fn cli_flag_wins_over_environment() {
    assert_eq!(resolve_level(Some(LogLevel::Debug), Some("error")), Level::DEBUG);
    assert_eq!(resolve_level(Some(LogLevel::Trace), None), Level::TRACE);
}

#[test]
fn environment_is_used_when_no_flag_is_given() {
    assert_eq!(resolve_level(None, Some("warn")), Level::WARN);
    assert_eq!(resolve_level(None, Some(" WARNING ")), Level::WARN);
    assert_eq!(resolve_level(None, Some("debug")), Level::DEBUG);
}

#[test]
fn unknown_or_missing_values_default_to_info() {
    assert_eq!(resolve_level(None, None), Level::INFO);
    assert_eq!(resolve_level(None, Some("chatty")), Level::INFO);
}
