//! # Bomber Shared
//!
//! Common types used by the socket thread, the reconciliation engine and the
//! render layer.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER perform I/O or own mutable game state.
//! It only describes values:
//! - the JSON-lines wire protocol ([`protocol`])
//! - the tile grid and its cell symbols ([`grid`])
//! - the position-derived identity of bombs and explosions ([`CellKey`])

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod error;
pub mod grid;
pub mod protocol;

pub use constants::{DEFAULT_HOST, DEFAULT_PORT, MAX_FRAME_BYTES, SPECULATIVE_FUSE_MS};
pub use error::{ProtocolError, ProtocolResult};
pub use grid::{BlastPolicy, Cell, CellKey, CellKeySet, Direction, Grid, GridPos};
pub use protocol::{
    CellWire, ClientCommand, ClientRole, PlayerWire, RoundState, ServerMessage, SnapshotWire,
};
