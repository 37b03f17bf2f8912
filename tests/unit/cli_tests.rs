//! Unit tests for CLI parsing and option merging.

use std::io::Write;
use std::path::Path;

use pipelink::cli;
use pipelink::config::DEFAULT_PORT;
use pipelink::AppError;

/// No arguments means no FIFOs, no socket target, and forward open order.
#[test]
fn bare_invocation_produces_an_empty_config() {
    let invocation = cli::try_parse_from(["pipelink"]).expect("bare invocation must parse");
    let config = invocation.config;

    assert_eq!(config.stdin_fifo, None);
    assert_eq!(config.stdout_fifo, None);
    assert_eq!(config.socket_target(), None);
    assert!(!config.reverse_fifo_order);
    assert!(!config.debug);
    assert!(!config.strict_exit);
}

/// The stdout-FIFO option before the stdin-FIFO option requests reverse
/// open order.
#[test]
fn stdout_before_stdin_requests_reverse_open_order() {
    let invocation = cli::try_parse_from(["pipelink", "-o", "/tmp/out", "-i", "/tmp/in"])
        .expect("fifo options must parse");

    assert!(
        invocation.config.reverse_fifo_order,
        "stdout-first ordering must set reverse_fifo_order"
    );
}

/// The stdin-FIFO option first keeps the forward open order.
#[test]
fn stdin_before_stdout_keeps_forward_open_order() {
    let invocation = cli::try_parse_from(["pipelink", "-i", "/tmp/in", "-o", "/tmp/out"])
        .expect("fifo options must parse");

    assert!(
        !invocation.config.reverse_fifo_order,
        "stdin-first ordering must keep the forward open order"
    );
}

/// An address alone enables socket mode with the default port.
#[test]
fn address_flag_enables_socket_mode() {
    let invocation =
        cli::try_parse_from(["pipelink", "-a", "203.0.113.9"]).expect("address must parse");

    assert_eq!(
        invocation.config.socket_target(),
        Some(("203.0.113.9".to_owned(), DEFAULT_PORT)),
    );
}

/// Port zero is refused by the argument parser.
#[test]
fn port_zero_is_refused() {
    let result = cli::try_parse_from(["pipelink", "-p", "0"]);
    assert!(
        matches!(result, Err(AppError::Config(_))),
        "port 0 must be refused, got: {result:?}"
    );
}

/// Positional arguments are accepted and retained, unused.
#[test]
fn positional_arguments_are_accepted_and_retained() {
    let invocation =
        cli::try_parse_from(["pipelink", "one", "two"]).expect("positionals must parse");

    assert_eq!(invocation.config.extra, vec!["one", "two"]);
}

/// CLI flags override values from the configuration file.
#[test]
fn cli_flags_override_the_config_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("pipelink.toml");
    let mut file = std::fs::File::create(&path).expect("create config file");
    writeln!(file, "address = \"198.51.100.1\"").expect("write config");
    writeln!(file, "port = 9000").expect("write config");
    writeln!(file, "stdin_fifo = \"/tmp/from-file\"").expect("write config");

    let config_arg = path.to_str().expect("utf8 path");
    let invocation = cli::try_parse_from([
        "pipelink",
        "--config",
        config_arg,
        "-a",
        "203.0.113.5",
    ])
    .expect("config file plus flags must parse");
    let config = invocation.config;

    assert_eq!(
        config.address.as_deref(),
        Some("203.0.113.5"),
        "the CLI address must win over the file"
    );
    assert_eq!(config.port, Some(9000), "file values without a flag survive");
    assert_eq!(
        config.stdin_fifo.as_deref(),
        Some(Path::new("/tmp/from-file")),
    );
}

/// The debug flag carries into the configuration.
#[test]
fn debug_flag_is_recorded() {
    let invocation = cli::try_parse_from(["pipelink", "-d"]).expect("debug flag must parse");
    assert!(invocation.config.debug);
}

/// An unknown flag is a config error rather than a panic.
#[test]
fn unknown_flag_is_an_error() {
    let result = cli::try_parse_from(["pipelink", "--no-such-flag"]);
    assert!(
        matches!(result, Err(AppError::Config(_))),
        "unknown flags must error, got: {result:?}"
    );
}
