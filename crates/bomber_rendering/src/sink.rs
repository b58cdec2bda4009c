//! # Render Sink
//!
//! The boundary to whatever actually draws. The scene adapter calls these
//! methods with fully resolved positions in both screen spaces; a sink
//! never maps coordinates itself.

use bomber_networking::{PlayerId, RenderHandle};
use bomber_shared::GridPos;

use crate::layout::{BoardLayout, Point, Rect, Space};
use crate::wall_skin::TileStyle;

/// Identity of a sprite on the sink side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SpriteId {
    /// The controlled player.
    Local,
    /// A bomb or remote player, by engine handle.
    Entity(RenderHandle),
}

/// What a sprite depicts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpriteKind {
    /// The controlled player.
    LocalPlayer {
        /// Liveness.
        alive: bool,
    },
    /// Another player.
    RemotePlayer {
        /// Identifier.
        id: PlayerId,
        /// Display name.
        name: String,
        /// Liveness.
        alive: bool,
    },
    /// An armed bomb; starts blinking when spawned.
    Bomb,
}

/// A cell resolved into both screen spaces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Grid cell.
    pub cell: GridPos,
    /// Center in the top-left-origin space.
    pub top_left: Point,
    /// Center in the bottom-left-origin space.
    pub bottom_left: Point,
    /// Tile edge length.
    pub tile: f32,
}

impl Placement {
    /// Resolves `cell` under `layout`.
    #[must_use]
    pub fn resolve(layout: &BoardLayout, cell: GridPos) -> Self {
        Self {
            cell,
            top_left: layout.cell_center(cell, Space::TopLeft),
            bottom_left: layout.cell_center(cell, Space::BottomLeft),
            tile: layout.tile(),
        }
    }
}

/// One wall tile to draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallTile {
    /// Grid cell.
    pub cell: GridPos,
    /// Square in the top-left-origin space.
    pub rect: Rect,
    /// How to draw it.
    pub style: TileStyle,
}

/// Consumer of resolved draw calls.
pub trait RenderSink {
    /// Redraws the whole board: background plus every wall tile.
    fn draw_board(&mut self, layout: &BoardLayout, walls: &[WallTile]);

    /// Erases wall tiles that became floor.
    fn clear_tiles(&mut self, cells: &[Placement]);

    /// Adds a sprite.
    fn spawn_sprite(&mut self, id: SpriteId, kind: &SpriteKind, at: Placement);

    /// Moves a sprite; `animate` asks for a tween instead of a jump.
    fn move_sprite(&mut self, id: SpriteId, at: Placement, animate: bool);

    /// Changes what a sprite depicts (e.g. a player died).
    fn restyle_sprite(&mut self, id: SpriteId, kind: &SpriteKind);

    /// Removes a sprite and frees its resources.
    fn despawn_sprite(&mut self, id: SpriteId);

    /// Plays the explosion effect once.
    fn play_explosion(&mut self, at: Placement);
}

// =============================================================================
// Recording Sink (For Testing)
// =============================================================================

/// A recorded sink call.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    /// [`RenderSink::draw_board`], with the wall count.
    DrawBoard {
        /// Layout used.
        layout: BoardLayout,
        /// Walls drawn.
        walls: usize,
    },
    /// [`RenderSink::clear_tiles`].
    ClearTiles(Vec<GridPos>),
    /// [`RenderSink::spawn_sprite`].
    Spawn(SpriteId, SpriteKind, Placement),
    /// [`RenderSink::move_sprite`].
    Move(SpriteId, Placement, bool),
    /// [`RenderSink::restyle_sprite`].
    Restyle(SpriteId, SpriteKind),
    /// [`RenderSink::despawn_sprite`].
    Despawn(SpriteId),
    /// [`RenderSink::play_explosion`].
    Explosion(Placement),
}

/// Sink that records every call; for tests and headless runs.
#[derive(Debug, Default)]
pub struct RecordingSink {
    calls: Vec<SinkCall>,
}

impl RecordingSink {
    /// Empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls so far.
    #[must_use]
    pub fn calls(&self) -> &[SinkCall] {
        &self.calls
    }

    /// Takes the calls so far, leaving the recorder empty.
    pub fn take(&mut self) -> Vec<SinkCall> {
        std::mem::take(&mut self.calls)
    }
}

impl RenderSink for RecordingSink {
    fn draw_board(&mut self, layout: &BoardLayout, walls: &[WallTile]) {
        self.calls.push(SinkCall::DrawBoard { layout: *layout, walls: walls.len() });
    }

    fn clear_tiles(&mut self, cells: &[Placement]) {
        self.calls.push(SinkCall::ClearTiles(cells.iter().map(|p| p.cell).collect()));
    }

    fn spawn_sprite(&mut self, id: SpriteId, kind: &SpriteKind, at: Placement) {
        self.calls.push(SinkCall::Spawn(id, kind.clone(), at));
    }

    fn move_sprite(&mut self, id: SpriteId, at: Placement, animate: bool) {
        self.calls.push(SinkCall::Move(id, at, animate));
    }

    fn restyle_sprite(&mut self, id: SpriteId, kind: &SpriteKind) {
        self.calls.push(SinkCall::Restyle(id, kind.clone()));
    }

    fn despawn_sprite(&mut self, id: SpriteId) {
        self.calls.push(SinkCall::Despawn(id));
    }

    fn play_explosion(&mut self, at: Placement) {
        self.calls.push(SinkCall::Explosion(at));
    }
}
