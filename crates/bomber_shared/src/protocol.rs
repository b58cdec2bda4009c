//! Wire protocol shared between client and server.
//!
//! One JSON object per line, discriminated by `type`. Both directions are
//! closed enums decoded exactly once at the socket boundary; nothing past the
//! transport ever sees a raw string discriminator.
//!
//! ```text
//! CLIENT                                   SERVER
//!   |--- {"type":"join","role":"player",...} -->|
//!   |<-- {"type":"assign_id","payload":"p1"} ---|
//!   |--- {"type":"ready"} --------------------->|
//!   |<-- {"type":"game_state","payload":{..}} --|  (periodic / on change)
//!   |--- {"type":"move","dx":1,"dy":0} -------->|
//!   |--- {"type":"place_bomb"} ---------------->|
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};
use crate::grid::{Direction, GridPos};

/// How a connection takes part in the match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientRole {
    /// Controls a character.
    #[default]
    Player,
    /// Watches only.
    Spectator,
}

/// Client → server commands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Enter the match.
    Join {
        /// Player or spectator.
        role: ClientRole,
        /// Display name; only sent for players.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    /// Declare ready in the lobby.
    Ready,
    /// Request a single-cell move.
    Move {
        /// Horizontal delta.
        dx: i32,
        /// Vertical delta.
        dy: i32,
    },
    /// Request a bomb at the current cell.
    PlaceBomb,
}

impl ClientCommand {
    /// Builds a `join`, dropping the name for spectators.
    #[must_use]
    pub fn join(role: ClientRole, name: impl Into<String>) -> Self {
        let name = match role {
            ClientRole::Player => Some(name.into()),
            ClientRole::Spectator => None,
        };
        Self::Join { role, name }
    }

    /// Builds a `move` for one orthogonal step.
    #[must_use]
    pub const fn step(direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self::Move { dx, dy }
    }

    /// Builds a `move` from raw deltas, rejecting anything but one
    /// orthogonal step.
    pub fn move_by(dx: i32, dy: i32) -> ProtocolResult<Self> {
        Direction::from_delta(dx, dy)
            .map(Self::step)
            .ok_or(ProtocolError::InvalidMove { dx, dy })
    }

    /// Serializes to a single JSON line (without the trailing newline).
    pub fn encode(&self) -> ProtocolResult<String> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    /// The wire discriminator, for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Ready => "ready",
            Self::Move { .. } => "move",
            Self::PlaceBomb => "place_bomb",
        }
    }
}

/// Round phase as broadcast by the server.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundState {
    /// Lobby: players gather and declare ready.
    #[default]
    Waiting,
    /// Match running.
    InProgress,
    /// Match finished; `winner` may be set.
    GameOver,
}

/// A player record as sent on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerWire {
    /// Stable per-connection identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
    /// Still in the round.
    pub alive: bool,
    /// Declared ready in the lobby.
    pub ready: bool,
}

/// A bomb or explosion cell as sent on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellWire {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl CellWire {
    /// As a grid position.
    #[must_use]
    pub const fn pos(self) -> GridPos {
        GridPos::new(self.x, self.y)
    }
}

/// One full authoritative frame, exactly as the server sends it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotWire {
    /// Round phase.
    pub state: RoundState,
    /// Row-major cell symbols.
    #[serde(default)]
    pub map: Vec<Vec<String>>,
    /// Roster.
    #[serde(default)]
    pub players: Vec<PlayerWire>,
    /// Armed bombs.
    #[serde(default)]
    pub bombs: Vec<CellWire>,
    /// Cells currently exploding.
    #[serde(default)]
    pub explosions: Vec<CellWire>,
    /// Seconds left in the round, if timed.
    #[serde(default)]
    pub time_remaining: Option<f64>,
    /// Winner id once the round is over.
    #[serde(default)]
    pub winner: Option<String>,
}

/// Server → client messages.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The permanent identifier of this connection's player.
    AssignId(String),
    /// A full authoritative snapshot.
    GameState(SnapshotWire),
}

impl ServerMessage {
    /// Decodes one inbound frame.
    ///
    /// Distinguishes frames that are not JSON at all
    /// ([`ProtocolError::Malformed`]) from JSON that matches neither known
    /// shape ([`ProtocolError::UnknownShape`]).
    pub fn decode(frame: &str) -> ProtocolResult<Self> {
        let value: serde_json::Value =
            serde_json::from_str(frame).map_err(ProtocolError::Malformed)?;
        let kind = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned);
        serde_json::from_value(value).map_err(|_| ProtocolError::UnknownShape { kind })
    }
}
