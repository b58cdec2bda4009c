//! # Client Configuration
//!
//! Loaded once at startup from TOML. Every key is optional; a missing file
//! section means "use the default".
//!
//! ```toml
//! host = "game.example.net"
//! port = 8765
//! player_name = "Ann"
//! role = "player"
//! speculative_fuse_ms = 1500
//! blast = { fixed = 2 }
//! ```

use std::path::Path;
use std::time::Duration;

use bomber_shared::constants::CONNECT_TIMEOUT_MS;
use bomber_shared::{BlastPolicy, ClientRole, DEFAULT_HOST, DEFAULT_PORT, MAX_FRAME_BYTES, SPECULATIVE_FUSE_MS};
use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};

/// Client configuration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Server host name or address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Name sent with `join` when playing.
    pub player_name: String,
    /// Player or spectator.
    pub role: ClientRole,
    /// TCP connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Longest inbound line accepted, in bytes.
    pub max_frame_bytes: usize,
    /// Local fuse for speculative wall clearing; `0` disables it.
    pub speculative_fuse_ms: u64,
    /// Propagation rule for speculative wall clearing.
    pub blast: BlastPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            player_name: "player".to_owned(),
            role: ClientRole::Player,
            connect_timeout_ms: CONNECT_TIMEOUT_MS,
            max_frame_bytes: MAX_FRAME_BYTES,
            speculative_fuse_ms: SPECULATIVE_FUSE_MS,
            blast: BlastPolicy::UntilObstacle,
        }
    }
}

impl ClientConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Rejects values that parse but cannot work.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid { key: "host", reason: "must not be empty" });
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid { key: "port", reason: "must be non-zero" });
        }
        if self.role == ClientRole::Player && self.player_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "player_name",
                reason: "required when role = \"player\"",
            });
        }
        if self.max_frame_bytes == 0 {
            return Err(ConfigError::Invalid { key: "max_frame_bytes", reason: "must be non-zero" });
        }
        if self.blast == BlastPolicy::Fixed(0) {
            return Err(ConfigError::Invalid { key: "blast", reason: "fixed range must be at least 1" });
        }
        Ok(())
    }

    /// `host:port`.
    #[must_use]
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Connect timeout as a duration.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Speculative fuse, or `None` when disabled.
    #[must_use]
    pub fn speculative_fuse(&self) -> Option<Duration> {
        (self.speculative_fuse_ms > 0).then(|| Duration::from_millis(self.speculative_fuse_ms))
    }
}
