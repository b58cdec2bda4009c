//! # Protocol Error Types
//!
//! Everything that can go wrong turning bytes into messages and back.

use thiserror::Error;

/// Errors raised at the wire boundary.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Outbound command could not be serialized.
    #[error("failed to encode command: {0}")]
    Encode(#[source] serde_json::Error),

    /// Inbound frame is not valid JSON.
    #[error("malformed frame: {0}")]
    Malformed(#[source] serde_json::Error),

    /// Inbound frame is valid JSON but matches neither known message shape.
    #[error("unrecognized message shape (type = {kind:?})")]
    UnknownShape {
        /// The `type` discriminator, if the frame carried one.
        kind: Option<String>,
    },

    /// Inbound frame exceeds the configured size limit.
    #[error("frame of {len} bytes exceeds limit of {limit}")]
    Oversized {
        /// Frame length in bytes.
        len: usize,
        /// Configured limit.
        limit: usize,
    },

    /// A move command with a delta other than one orthogonal step.
    #[error("invalid move delta ({dx}, {dy})")]
    InvalidMove {
        /// Horizontal delta.
        dx: i32,
        /// Vertical delta.
        dy: i32,
    },
}

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
