//! Relay configuration: option merging, validation, and defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{AppError, Result};

/// Address used when only a port was configured.
pub const DEFAULT_ADDRESS: &str = "127.0.0.1";

/// Port used when only an address was configured.
pub const DEFAULT_PORT: u16 = 5555;

/// Configuration consumed by the relay core.
///
/// Produced by the CLI layer ([`crate::cli`]) or parsed from a TOML file;
/// explicit CLI flags override file values. The core never touches `argv`
/// itself.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct RelayConfig {
    /// Path of the FIFO the relay reads local input from.
    #[serde(default)]
    pub stdin_fifo: Option<PathBuf>,
    /// Path of the FIFO the relay writes local output to.
    #[serde(default)]
    pub stdout_fifo: Option<PathBuf>,
    /// Peer network address, also used as the bind address in server role.
    #[serde(default)]
    pub address: Option<String>,
    /// Peer network port.
    #[serde(default)]
    pub port: Option<u16>,
    /// Open the stdout FIFO before the stdin FIFO.
    ///
    /// Opening a FIFO write end waits until a peer opens the matching read
    /// end, so two cooperating instances must open their FIFO pairs in
    /// opposite orders. The CLI sets this when the stdout-FIFO option was
    /// supplied before the stdin-FIFO option.
    #[serde(default)]
    pub reverse_fifo_order: bool,
    /// Raise the default log filter to `debug`.
    #[serde(default)]
    pub debug: bool,
    /// Exit nonzero on fatal resolution or endpoint-open failures instead of
    /// the historical always-success status.
    #[serde(default)]
    pub strict_exit: bool,
    /// Positional arguments accepted for compatibility and ignored.
    #[serde(skip)]
    pub extra: Vec<String>,
}

impl RelayConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// The socket target to negotiate with, if socket mode is configured.
    ///
    /// Returns `None` only when neither address nor port was given; a missing
    /// half takes its fixed default ([`DEFAULT_ADDRESS`] / [`DEFAULT_PORT`]).
    #[must_use]
    pub fn socket_target(&self) -> Option<(String, u16)> {
        if self.address.is_none() && self.port.is_none() {
            return None;
        }
        let address = self
            .address
            .clone()
            .unwrap_or_else(|| DEFAULT_ADDRESS.to_owned());
        let port = self.port.unwrap_or(DEFAULT_PORT);
        Some((address, port))
    }

    /// Validate option values.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when a value is out of range or empty.
    pub fn validate(&self) -> Result<()> {
        if self.port == Some(0) {
            return Err(AppError::Config("port must be nonzero".into()));
        }

        if matches!(self.address.as_deref(), Some("")) {
            return Err(AppError::Config("address must not be empty".into()));
        }

        for (name, path) in [
            ("stdin_fifo", &self.stdin_fifo),
            ("stdout_fifo", &self.stdout_fifo),
        ] {
            if matches!(path.as_deref(), Some(p) if p.as_os_str().is_empty()) {
                return Err(AppError::Config(format!("{name} path must not be empty")));
            }
        }

        Ok(())
    }
}
