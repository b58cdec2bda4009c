//! # Scene Adapter
//!
//! Applies [`RenderOp`]s to a [`RenderSink`], resolving every cell through
//! one [`BoardLayout`].
//!
//! ```text
//! RenderOp ──► SceneAdapter ──► Placement { top_left, bottom_left } ──► RenderSink
//!                  │
//!                  └─ sprite table: SpriteId → (kind, cell)
//! ```
//!
//! The adapter remembers where each sprite is so it can reposition all of
//! them after a viewport change or a board of different dimensions, and so
//! repeated updates with unchanged values never reach the sink.

use std::collections::BTreeMap;
use std::sync::Arc;

use bomber_networking::{PlayerView, RenderOp};
use bomber_shared::{Cell, Grid, GridPos};

use crate::layout::{BoardLayout, Size, Space};
use crate::sink::{Placement, RenderSink, SpriteId, SpriteKind, WallTile};
use crate::wall_skin::style_for;

/// Counters over the adapter's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStats {
    /// Ops applied.
    pub ops_applied: u64,
    /// Updates that changed nothing and were not forwarded.
    pub noop_updates: u64,
    /// Ops naming a handle the adapter never saw created.
    pub unknown_handles: u64,
    /// Full board redraws.
    pub board_redraws: u64,
}

#[derive(Debug, Clone)]
struct Sprite {
    kind: SpriteKind,
    cell: GridPos,
}

/// Keeps a sink in sync with the engine's op stream.
#[derive(Debug)]
pub struct SceneAdapter<S> {
    sink: S,
    viewport: Size,
    layout: BoardLayout,
    grid: Arc<Grid>,
    sprites: BTreeMap<SpriteId, Sprite>,
    stats: SceneStats,
}

impl<S: RenderSink> SceneAdapter<S> {
    /// Adapter over `sink` for a viewport of `viewport`.
    pub fn new(sink: S, viewport: Size) -> Self {
        Self {
            sink,
            viewport,
            layout: BoardLayout::fit(0, 0, viewport),
            grid: Arc::new(Grid::empty()),
            sprites: BTreeMap::new(),
            stats: SceneStats::default(),
        }
    }

    /// The sink.
    #[inline]
    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// The sink, mutably.
    #[inline]
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Current layout.
    #[inline]
    #[must_use]
    pub const fn layout(&self) -> &BoardLayout {
        &self.layout
    }

    /// Board as drawn, including speculative clearing.
    #[inline]
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Lifetime counters.
    #[inline]
    #[must_use]
    pub const fn stats(&self) -> SceneStats {
        self.stats
    }

    /// Live sprites with their cells, in id order.
    pub fn sprites(&self) -> impl Iterator<Item = (SpriteId, &SpriteKind, GridPos)> + '_ {
        self.sprites.iter().map(|(id, s)| (*id, &s.kind, s.cell))
    }

    /// Resolves a cell under the current layout.
    #[must_use]
    pub fn placement(&self, cell: GridPos) -> Placement {
        Placement::resolve(&self.layout, cell)
    }

    /// Applies ops in order.
    pub fn apply_all<'a>(&mut self, ops: impl IntoIterator<Item = &'a RenderOp>) {
        for op in ops {
            self.apply(op);
        }
    }

    /// Applies one op.
    pub fn apply(&mut self, op: &RenderOp) {
        self.stats.ops_applied += 1;
        match op {
            RenderOp::ReplaceGrid { grid } => self.replace_grid(Arc::clone(grid)),
            RenderOp::ClearTiles { cells } => self.clear_tiles(cells),
            RenderOp::AnimateExplosion { key } => {
                let at = self.placement(key.pos());
                self.sink.play_explosion(at);
            }
            RenderOp::MoveLocalPlayer { position, alive, animate } => {
                let kind = SpriteKind::LocalPlayer { alive: *alive };
                if self.sprites.contains_key(&SpriteId::Local) {
                    self.update(SpriteId::Local, kind, *position, *animate);
                } else {
                    self.spawn(SpriteId::Local, kind, *position);
                }
            }
            RenderOp::RemoveLocalPlayer => self.despawn(SpriteId::Local),
            RenderOp::CreateBomb { handle, key } => {
                self.spawn(SpriteId::Entity(*handle), SpriteKind::Bomb, key.pos());
            }
            RenderOp::UpdateBomb { handle, key } => {
                self.update(SpriteId::Entity(*handle), SpriteKind::Bomb, key.pos(), false);
            }
            RenderOp::CreatePlayer { handle, view } => {
                self.spawn(SpriteId::Entity(*handle), remote(view), view.pos);
            }
            RenderOp::UpdatePlayer { handle, view } => {
                self.update(SpriteId::Entity(*handle), remote(view), view.pos, true);
            }
            RenderOp::RemoveBomb { handle, .. } | RenderOp::RemovePlayer { handle, .. } => {
                self.despawn(SpriteId::Entity(*handle));
            }
        }
    }

    /// Adopts a new viewport and, if the layout changes, redraws the board
    /// and repositions every sprite.
    pub fn resize(&mut self, viewport: Size) {
        self.viewport = viewport;
        self.relayout();
    }

    fn relayout(&mut self) {
        let layout = BoardLayout::fit(self.grid.cols(), self.grid.rows(), self.viewport);
        if layout == self.layout {
            return;
        }
        tracing::debug!(tile = layout.tile(), "relayout");
        self.layout = layout;
        self.redraw_board();
        let moves: Vec<(SpriteId, GridPos)> =
            self.sprites.iter().map(|(id, s)| (*id, s.cell)).collect();
        for (id, cell) in moves {
            let at = self.placement(cell);
            self.sink.move_sprite(id, at, false);
        }
    }

    fn replace_grid(&mut self, grid: Arc<Grid>) {
        let resized = (grid.cols(), grid.rows()) != self.layout.dims();
        self.grid = grid;
        if resized {
            self.relayout();
        } else {
            self.redraw_board();
        }
    }

    fn redraw_board(&mut self) {
        let walls: Vec<WallTile> = self
            .grid
            .iter()
            .filter_map(|(cell, _)| {
                style_for(&self.grid, cell).map(|style| WallTile {
                    cell,
                    rect: self.layout.cell_rect(cell, Space::TopLeft),
                    style,
                })
            })
            .collect();
        self.stats.board_redraws += 1;
        self.sink.draw_board(&self.layout, &walls);
    }

    fn clear_tiles(&mut self, cells: &[GridPos]) {
        let grid = Arc::make_mut(&mut self.grid);
        let cleared: Vec<GridPos> =
            cells.iter().copied().filter(|c| grid.set(*c, Cell::Empty)).collect();
        let at: Vec<Placement> = cleared.iter().map(|c| self.placement(*c)).collect();
        if !at.is_empty() {
            self.sink.clear_tiles(&at);
        }
    }

    fn spawn(&mut self, id: SpriteId, kind: SpriteKind, cell: GridPos) {
        let at = self.placement(cell);
        self.sink.spawn_sprite(id, &kind, at);
        if self.sprites.insert(id, Sprite { kind, cell }).is_some() {
            tracing::warn!(?id, "sprite spawned twice; replaced");
        }
    }

    fn update(&mut self, id: SpriteId, kind: SpriteKind, cell: GridPos, animate: bool) {
        let Some(sprite) = self.sprites.get_mut(&id) else {
            self.stats.unknown_handles += 1;
            tracing::warn!(?id, "update for unknown sprite; ignored");
            return;
        };
        let moved = sprite.cell != cell;
        let step = (sprite.cell.x - cell.x).abs() + (sprite.cell.y - cell.y).abs() == 1;
        let restyled = sprite.kind != kind;
        if !moved && !restyled {
            self.stats.noop_updates += 1;
            return;
        }
        sprite.cell = cell;
        if restyled {
            sprite.kind = kind.clone();
        }

        if moved {
            let at = Placement::resolve(&self.layout, cell);
            self.sink.move_sprite(id, at, animate && step);
        }
        if restyled {
            self.sink.restyle_sprite(id, &kind);
        }
    }

    fn despawn(&mut self, id: SpriteId) {
        if self.sprites.remove(&id).is_none() {
            self.stats.unknown_handles += 1;
            tracing::warn!(?id, "remove for unknown sprite; ignored");
            return;
        }
        self.sink.despawn_sprite(id);
    }
}

fn remote(view: &PlayerView) -> SpriteKind {
    SpriteKind::RemotePlayer { id: view.id.clone(), name: view.name.clone(), alive: view.alive }
}
