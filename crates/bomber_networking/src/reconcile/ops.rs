//! Render operations emitted by the reconciliation engine.

use std::fmt;
use std::sync::Arc;

use bomber_shared::{CellKey, Grid, GridPos};

use crate::snapshot::{PlayerId, PlayerRecord};

/// Opaque identity of one rendered resource (sprite, node, ...).
///
/// Allocated by the engine, never reused within one engine's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RenderHandle(u64);

impl RenderHandle {
    /// Raw value, for sinks that index by integer.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Rebuilds a handle from [`RenderHandle::raw`], e.g. when replaying a
    /// recorded op stream.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for RenderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the sink needs to draw a remote player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerView {
    /// Identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Cell.
    pub pos: GridPos,
    /// Liveness.
    pub alive: bool,
}

impl From<&PlayerRecord> for PlayerView {
    fn from(record: &PlayerRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            pos: record.pos,
            alive: record.alive,
        }
    }
}

/// One instruction for the render sink.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderOp {
    /// Move or restyle the controlled player.
    MoveLocalPlayer {
        /// Cell.
        position: GridPos,
        /// Liveness.
        alive: bool,
        /// One step from the previous cell; the sink may tween it.
        animate: bool,
    },
    /// Redraw the board from this grid.
    ReplaceGrid {
        /// New board.
        grid: Arc<Grid>,
    },
    /// Cells speculatively cleared ahead of the server.
    ClearTiles {
        /// Cells now empty.
        cells: Vec<GridPos>,
    },
    /// Play the explosion effect once on this cell.
    AnimateExplosion {
        /// Exploding cell.
        key: CellKey,
    },
    /// New bomb; start its armed (blinking) visual.
    CreateBomb {
        /// Resource handle.
        handle: RenderHandle,
        /// Cell.
        key: CellKey,
    },
    /// Bomb still present; refresh position only.
    UpdateBomb {
        /// Resource handle.
        handle: RenderHandle,
        /// Cell.
        key: CellKey,
    },
    /// Bomb gone or pre-empted by its explosion.
    RemoveBomb {
        /// Resource handle.
        handle: RenderHandle,
        /// Cell.
        key: CellKey,
    },
    /// Remote player appeared.
    CreatePlayer {
        /// Resource handle.
        handle: RenderHandle,
        /// Initial view.
        view: PlayerView,
    },
    /// Remote player still present.
    UpdatePlayer {
        /// Resource handle.
        handle: RenderHandle,
        /// Current view.
        view: PlayerView,
    },
    /// Remote player left the roster.
    RemovePlayer {
        /// Resource handle.
        handle: RenderHandle,
        /// Who left.
        id: PlayerId,
    },
    /// Controlled player is gone (left the snapshot, or the session ended).
    RemoveLocalPlayer,
}

impl RenderOp {
    /// True for ops that allocate a handle.
    #[must_use]
    pub const fn is_create(&self) -> bool {
        matches!(self, Self::CreateBomb { .. } | Self::CreatePlayer { .. })
    }

    /// True for ops that free a handle.
    #[must_use]
    pub const fn is_remove(&self) -> bool {
        matches!(self, Self::RemoveBomb { .. } | Self::RemovePlayer { .. })
    }

    /// True for one-shot effect triggers.
    #[must_use]
    pub const fn is_one_shot(&self) -> bool {
        matches!(self, Self::AnimateExplosion { .. })
    }

    /// The handle this op refers to, if any.
    #[must_use]
    pub const fn handle(&self) -> Option<RenderHandle> {
        match self {
            Self::CreateBomb { handle, .. }
            | Self::UpdateBomb { handle, .. }
            | Self::RemoveBomb { handle, .. }
            | Self::CreatePlayer { handle, .. }
            | Self::UpdatePlayer { handle, .. }
            | Self::RemovePlayer { handle, .. } => Some(*handle),
            Self::MoveLocalPlayer { .. }
            | Self::RemoveLocalPlayer
            | Self::ReplaceGrid { .. }
            | Self::ClearTiles { .. }
            | Self::AnimateExplosion { .. } => None,
        }
    }
}
