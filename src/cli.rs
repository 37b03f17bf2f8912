//! Command-line argument parsing.
//!
//! A thin collaborator around the relay core: it turns `argv` (and an
//! optional TOML file) into a [`RelayConfig`] and never touches endpoints
//! itself. The one subtlety it owns is FIFO open ordering: the relative
//! position of `--stdout-fifo` and `--stdin-fifo` on the command line decides
//! whether the FIFOs are opened in reverse order (see
//! [`RelayConfig::reverse_fifo_order`]).

use std::path::PathBuf;

use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, ValueEnum};

use crate::config::RelayConfig;
use crate::{AppError, Result};

/// Log output format selector.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable single-line text.
    Text,
    /// Structured JSON, one event per line.
    Json,
}

/// Command-line options.
#[derive(Debug, Parser)]
#[command(
    name = "pipelink",
    about = "Relay terminal or FIFO streams to a peer over TCP",
    version,
    long_about = None
)]
pub struct Cli {
    /// FIFO to read local input from.
    #[arg(short = 'i', long, value_name = "FIFO")]
    pub stdin_fifo: Option<PathBuf>,

    /// FIFO to write local output to.
    #[arg(short = 'o', long, value_name = "FIFO")]
    pub stdout_fifo: Option<PathBuf>,

    /// Network address of the peer, also the bind address in server role.
    #[arg(short = 'a', long, value_name = "ADDRESS")]
    pub address: Option<String>,

    /// Network port.
    #[arg(short = 'p', long, value_name = "PORT", value_parser = clap::value_parser!(u16).range(1..))]
    pub port: Option<u16>,

    /// Print debug messages.
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Optional TOML configuration file; explicit flags override it.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Exit nonzero on fatal resolution or endpoint-open failures.
    #[arg(long)]
    pub strict_exit: bool,

    /// Positional arguments, accepted for compatibility and ignored.
    #[arg(value_name = "FILE")]
    pub extra: Vec<String>,
}

/// A fully parsed invocation: the relay configuration plus logging options.
#[derive(Debug)]
pub struct Invocation {
    /// Configuration handed to the relay core.
    pub config: RelayConfig,
    /// Selected log output format.
    pub log_format: LogFormat,
}

/// Parse the process arguments.
///
/// Exits the process with clap's usual diagnostics on malformed arguments.
///
/// # Errors
///
/// Returns `AppError::Config` when the referenced configuration file is
/// unreadable or invalid.
pub fn parse() -> Result<Invocation> {
    let matches = Cli::command().get_matches();
    from_matches(&matches)
}

/// Parse an explicit argument list, for tests and embedding.
///
/// # Errors
///
/// Returns `AppError::Config` on malformed arguments or an invalid
/// configuration file.
pub fn try_parse_from<I, T>(args: I) -> Result<Invocation>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = Cli::command()
        .try_get_matches_from(args)
        .map_err(|err| AppError::Config(err.to_string()))?;
    from_matches(&matches)
}

/// Merge CLI options over the optional configuration file.
fn from_matches(matches: &ArgMatches) -> Result<Invocation> {
    let cli = Cli::from_arg_matches(matches).map_err(|err| AppError::Config(err.to_string()))?;

    let mut config = match cli.config {
        Some(ref path) => RelayConfig::load_from_path(path)?,
        None => RelayConfig::default(),
    };

    if cli.stdin_fifo.is_some() {
        config.stdin_fifo = cli.stdin_fifo;
    }
    if cli.stdout_fifo.is_some() {
        config.stdout_fifo = cli.stdout_fifo;
    }
    if cli.address.is_some() {
        config.address = cli.address;
    }
    if cli.port.is_some() {
        config.port = cli.port;
    }
    config.debug |= cli.debug;
    config.strict_exit |= cli.strict_exit;
    config.extra = cli.extra;

    // The stdout-FIFO option appearing before the stdin-FIFO option requests
    // reverse open order (output end first).
    if let (Some(out_idx), Some(in_idx)) = (
        matches.index_of("stdout_fifo"),
        matches.index_of("stdin_fifo"),
    ) {
        config.reverse_fifo_order = out_idx < in_idx;
    }

    config.validate()?;

    Ok(Invocation {
        config,
        log_format: cli.log_format,
    })
}
