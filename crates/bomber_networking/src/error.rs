//! # Networking Error Types
//!
//! Transport failures and config failures. Decode failures of individual
//! frames are not here on purpose: they are logged and dropped by the
//! receive loop and never reach a caller.

use std::path::PathBuf;

use bomber_shared::ProtocolError;
use thiserror::Error;

/// Errors raised by the transport channel.
#[derive(Error, Debug)]
pub enum NetError {
    /// Socket-level failure (connect, read, write).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding or decoding failure at the wire boundary.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// `host:port` resolved to no usable address.
    #[error("could not resolve {0}")]
    Unresolvable(String),

    /// The server closed the connection.
    #[error("connection closed by server")]
    ClosedByPeer,
}

/// Result type for transport operations.
pub type NetResult<T> = Result<T, NetError>;

/// Errors raised while loading client configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read config {path}: {source}")]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or has wrongly-typed keys.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is out of range.
    #[error("invalid value for `{key}`: {reason}")]
    Invalid {
        /// Offending key.
        key: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
}

/// Result type for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
