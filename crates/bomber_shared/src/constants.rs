//! # Network Constants
//!
//! Defaults baked into the client. Every one of them can be overridden from
//! the client's TOML config.

// =============================================================================
// NETWORK CONFIGURATION
// =============================================================================

/// Default game server host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default game server port.
pub const DEFAULT_PORT: u16 = 8765;

/// Longest inbound line accepted by the transport, in bytes.
///
/// A full snapshot of a 15x13 board with a handful of players is well under
/// 4 KiB; anything near this limit is garbage.
pub const MAX_FRAME_BYTES: usize = 1 << 20;

/// Default connect timeout in milliseconds.
pub const CONNECT_TIMEOUT_MS: u64 = 3_000;

// =============================================================================
// GAMEPLAY
// =============================================================================

/// Local fuse (ms) after which a locally placed bomb speculatively clears
/// destructible walls in the client's working grid.
pub const SPECULATIVE_FUSE_MS: u64 = 1_500;

/// Symbol the server uses for an indestructible wall.
pub const SYMBOL_INDESTRUCTIBLE: &str = "#";

/// Symbol the server uses for a destructible wall.
pub const SYMBOL_DESTRUCTIBLE: &str = ".";

/// Symbol this client writes back for a walkable cell.
pub const SYMBOL_EMPTY: &str = " ";
