//! Command-line flags.
//!
//! ```bash
//! bomber_client --config client.toml --name Ann --auto-ready
//! bomber_client --host 10.0.0.5 --port 9000 --spectator
//! ```
//!
//! Flags override the values loaded from `--config` (or the defaults).

use std::path::PathBuf;

use bomber_networking::ClientConfig;
use bomber_shared::ClientRole;
use thiserror::Error;

/// Bad command line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    /// A flag that takes a value was last.
    #[error("{0} needs a value")]
    MissingValue(&'static str),
    /// A value failed to parse.
    #[error("invalid value for {flag}: {value}")]
    InvalidValue {
        /// Flag name.
        flag: &'static str,
        /// What was given.
        value: String,
    },
    /// Not a known flag.
    #[error("unknown argument: {0}")]
    Unknown(String),
}

/// Parsed flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliArgs {
    /// `--config <path>`
    pub config: Option<PathBuf>,
    /// `--host <host>`
    pub host: Option<String>,
    /// `--port <port>`
    pub port: Option<u16>,
    /// `--name <name>`
    pub name: Option<String>,
    /// `--spectator`
    pub spectator: bool,
    /// `--auto-ready`: send `ready` whenever the lobby is entered.
    pub auto_ready: bool,
    /// `--help`
    pub help: bool,
}

/// Usage text for `--help`.
pub const USAGE: &str = "\
Usage: bomber_client [OPTIONS]

Options:
  -c, --config <PATH>   TOML config file
      --host <HOST>     Server host (default: localhost)
  -p, --port <PORT>     Server port (default: 8765)
  -n, --name <NAME>     Player name
      --spectator       Join as a spectator
      --auto-ready      Declare ready on entering the lobby
  -h, --help            Show this help

Keys (type a line, then Enter): w a s d move, b bomb, r ready, q quit
Log level: RUST_LOG (default: info)";

impl CliArgs {
    /// Parses flags, excluding the program name.
    pub fn parse<I>(args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut out = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => out.config = Some(value(&mut args, "--config")?.into()),
                "--host" => out.host = Some(value(&mut args, "--host")?),
                "--port" | "-p" => {
                    let raw = value(&mut args, "--port")?;
                    let port = raw.parse().map_err(|_| CliError::InvalidValue {
                        flag: "--port",
                        value: raw,
                    })?;
                    out.port = Some(port);
                }
                "--name" | "-n" => out.name = Some(value(&mut args, "--name")?),
                "--spectator" => out.spectator = true,
                "--auto-ready" => out.auto_ready = true,
                "--help" | "-h" => out.help = true,
                _ => return Err(CliError::Unknown(arg)),
            }
        }
        Ok(out)
    }

    /// Applies the flags on top of `config`.
    pub fn apply(&self, config: &mut ClientConfig) {
        if let Some(host) = &self.host {
            config.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(name) = &self.name {
            config.player_name.clone_from(name);
        }
        if self.spectator {
            config.role = ClientRole::Spectator;
        }
    }
}

fn value(args: &mut impl Iterator<Item = String>, flag: &'static str) -> Result<String, CliError> {
    args.next().ok_or(CliError::MissingValue(flag))
}
