//! # ASCII Sink
//!
//! A [`RenderSink`] that keeps a character picture of the board and hands
//! it out whenever something changed.
//!
//! ```text
//!   =========
//!   |@  :  A|      =  |   indestructible wall (horizontal / vertical)
//!   | | |o| |      :      destructible wall
//!   |  * *  |      @ A o  local player, remote player, bomb
//!   =========      * x    explosion (one frame), dead player
//! ```
//!
//! Only grid cells matter here; screen positions in the placements are
//! ignored.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use bomber_rendering::{
    BoardLayout, Orientation, Placement, RenderSink, SpriteId, SpriteKind, WallTile,
};
use bomber_shared::{Cell, GridPos};

const BOMB: char = 'o';
const DEAD: char = 'x';
const EXPLOSION: char = '*';
const LOCAL: char = '@';
const REMOTE: char = 'P';

/// Text renderer for the terminal client.
#[derive(Debug, Default)]
pub struct AsciiSink {
    cols: usize,
    rows: usize,
    walls: BTreeMap<GridPos, char>,
    sprites: BTreeMap<SpriteId, (char, GridPos)>,
    blasts: Vec<GridPos>,
    dirty: bool,
}

impl AsciiSink {
    /// Blank sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True if the picture changed since the last [`AsciiSink::take_frame`].
    #[inline]
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The picture, if it changed. Explosions are shown in exactly one
    /// taken frame.
    pub fn take_frame(&mut self) -> Option<String> {
        if !self.dirty {
            return None;
        }
        let frame = self.render();
        self.blasts.clear();
        self.dirty = false;
        Some(frame)
    }

    /// The current picture, one line per row.
    #[must_use]
    pub fn render(&self) -> String {
        let mut canvas = vec![vec![' '; self.cols]; self.rows];
        let mut put = |pos: GridPos, ch: char| {
            if pos.x >= 0 && pos.y >= 0 {
                if let Some(slot) =
                    canvas.get_mut(pos.y as usize).and_then(|row| row.get_mut(pos.x as usize))
                {
                    *slot = ch;
                }
            }
        };

        for (pos, ch) in &self.walls {
            put(*pos, *ch);
        }
        // Bombs under players, the local player on top.
        let (bombs, players): (Vec<_>, Vec<_>) =
            self.sprites.values().partition(|(ch, _)| *ch == BOMB);
        for (ch, pos) in bombs.into_iter().chain(players.into_iter().rev()) {
            put(pos, ch);
        }
        for pos in &self.blasts {
            put(*pos, EXPLOSION);
        }

        let mut out = String::with_capacity(self.rows * (self.cols + 1));
        for row in canvas {
            let line: String = row.into_iter().collect();
            let _ = writeln!(out, "{}", line.trim_end());
        }
        out
    }

    fn touch(&mut self) {
        self.dirty = true;
    }
}

fn wall_glyph(tile: &WallTile) -> char {
    match (tile.style.cell, tile.style.orientation) {
        (Cell::DestructibleWall, _) => ':',
        (_, Orientation::Horizontal) => '=',
        (_, Orientation::Vertical) => '|',
    }
}

fn sprite_glyph(kind: &SpriteKind) -> char {
    match kind {
        SpriteKind::Bomb => BOMB,
        SpriteKind::LocalPlayer { alive: true } => LOCAL,
        SpriteKind::RemotePlayer { name, alive: true, .. } => name
            .chars()
            .find(char::is_ascii_alphanumeric)
            .map_or(REMOTE, |c| c.to_ascii_uppercase()),
        SpriteKind::LocalPlayer { alive: false } | SpriteKind::RemotePlayer { alive: false, .. } => {
            DEAD
        }
    }
}

impl RenderSink for AsciiSink {
    fn draw_board(&mut self, layout: &BoardLayout, walls: &[WallTile]) {
        (self.cols, self.rows) = layout.dims();
        self.walls = walls.iter().map(|w| (w.cell, wall_glyph(w))).collect();
        self.touch();
    }

    fn clear_tiles(&mut self, cells: &[Placement]) {
        for at in cells {
            self.walls.remove(&at.cell);
        }
        self.touch();
    }

    fn spawn_sprite(&mut self, id: SpriteId, kind: &SpriteKind, at: Placement) {
        self.sprites.insert(id, (sprite_glyph(kind), at.cell));
        self.touch();
    }

    fn move_sprite(&mut self, id: SpriteId, at: Placement, _animate: bool) {
        if let Some((_, cell)) = self.sprites.get_mut(&id) {
            *cell = at.cell;
            self.touch();
        }
    }

    fn restyle_sprite(&mut self, id: SpriteId, kind: &SpriteKind) {
        if let Some((glyph, _)) = self.sprites.get_mut(&id) {
            *glyph = sprite_glyph(kind);
            self.touch();
        }
    }

    fn despawn_sprite(&mut self, id: SpriteId) {
        if self.sprites.remove(&id).is_some() {
            self.touch();
        }
    }

    fn play_explosion(&mut self, at: Placement) {
        self.blasts.push(at.cell);
        self.touch();
    }
}
