//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Socket role negotiation failure: neither client-connect nor
    /// server-bind/listen reached the peer address.
    Resolve(String),
    /// A FIFO or other endpoint failed to open.
    Endpoint(String),
    /// Mid-session read or write failure on an active transfer loop.
    Transfer(String),
    /// Any other I/O operation failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Resolve(msg) => write!(f, "resolve: {msg}"),
            Self::Endpoint(msg) => write!(f, "endpoint: {msg}"),
            Self::Transfer(msg) => write!(f, "transfer: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
