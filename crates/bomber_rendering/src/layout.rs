//! # Board Layout
//!
//! Fits a `cols x rows` board into a viewport with square tiles, and maps
//! cells into the two screen spaces the client composites:
//!
//! ```text
//!  TopLeft (UI)                 BottomLeft (animated layer)
//!  (0,0)──────► x               y ▲
//!    │  ┌──────────┐              │  ┌──────────┐
//!    │  │ board    │              │  │ board    │
//!    ▼  └──────────┘              │  └──────────┘
//!    y                          (0,0)──────► x
//!
//!  tile   = floor(min(w / cols, h / rows))
//!  origin = ((w - cols*tile) / 2, (h - rows*tile) / 2)      (TopLeft)
//!  center = origin + (x + 0.5, y + 0.5) * tile              (TopLeft)
//!  flipped.y = h - center.y                                 (BottomLeft)
//! ```
//!
//! Both spaces are derived from the same [`BoardLayout`], so a cell sits at
//! the same physical point in both.

use bomber_shared::GridPos;

/// A point in screen coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    /// Horizontal.
    pub x: f32,
    /// Vertical.
    pub y: f32,
}

impl Point {
    /// Creates a point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A viewport size.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl Size {
    /// Creates a size.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// A rectangle in screen coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Edge nearest the space's origin (top in TopLeft, bottom in BottomLeft).
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl Rect {
    /// Creates a rectangle.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Far edge from the origin.
    #[must_use]
    pub fn far(&self) -> f32 {
        self.y + self.height
    }

    /// Center point.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// True if the point is inside (half-open).
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.far()
    }
}

/// Which screen space a coordinate is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Space {
    /// Origin at the top-left, y grows downward.
    TopLeft,
    /// Origin at the bottom-left, y grows upward.
    BottomLeft,
}

/// Tile size and board origin for one grid in one viewport.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoardLayout {
    cols: usize,
    rows: usize,
    viewport: Size,
    tile: f32,
    origin: Point,
}

impl BoardLayout {
    /// Fits a `cols x rows` board into `viewport`.
    ///
    /// An empty board or a degenerate viewport yields a zero tile size; every
    /// cell then maps to the centered origin.
    #[must_use]
    pub fn fit(cols: usize, rows: usize, viewport: Size) -> Self {
        let tile = if cols == 0 || rows == 0 {
            0.0
        } else {
            (viewport.width / cols as f32)
                .min(viewport.height / rows as f32)
                .floor()
                .max(0.0)
        };
        let origin = Point::new(
            (viewport.width - cols as f32 * tile) / 2.0,
            (viewport.height - rows as f32 * tile) / 2.0,
        );
        Self { cols, rows, viewport, tile, origin }
    }

    /// Edge length of one square tile.
    #[inline]
    #[must_use]
    pub const fn tile(&self) -> f32 {
        self.tile
    }

    /// Viewport the layout was computed for.
    #[inline]
    #[must_use]
    pub const fn viewport(&self) -> Size {
        self.viewport
    }

    /// Board dimensions.
    #[inline]
    #[must_use]
    pub const fn dims(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Board origin in `space`: the top-left corner of cell (0,0) for
    /// TopLeft, the bottom-left corner of the last row for BottomLeft.
    #[must_use]
    pub fn origin(&self, space: Space) -> Point {
        match space {
            Space::TopLeft => self.origin,
            Space::BottomLeft => Point::new(
                self.origin.x,
                self.viewport.height - (self.origin.y + self.rows as f32 * self.tile),
            ),
        }
    }

    /// Center of `cell` in `space`.
    #[must_use]
    pub fn cell_center(&self, cell: GridPos, space: Space) -> Point {
        let ui = Point::new(
            self.origin.x + (cell.x as f32 + 0.5) * self.tile,
            self.origin.y + (cell.y as f32 + 0.5) * self.tile,
        );
        match space {
            Space::TopLeft => ui,
            Space::BottomLeft => Point::new(ui.x, self.viewport.height - ui.y),
        }
    }

    /// Square occupied by `cell` in `space`.
    #[must_use]
    pub fn cell_rect(&self, cell: GridPos, space: Space) -> Rect {
        let x = self.origin.x + cell.x as f32 * self.tile;
        let top = self.origin.y + cell.y as f32 * self.tile;
        let y = match space {
            Space::TopLeft => top,
            Space::BottomLeft => self.viewport.height - (top + self.tile),
        };
        Rect::new(x, y, self.tile, self.tile)
    }

    /// Whole board in `space`.
    #[must_use]
    pub fn board_rect(&self, space: Space) -> Rect {
        let origin = self.origin(space);
        Rect::new(
            origin.x,
            origin.y,
            self.cols as f32 * self.tile,
            self.rows as f32 * self.tile,
        )
    }

    /// Cell under a screen point, if any.
    #[must_use]
    pub fn cell_at(&self, point: Point, space: Space) -> Option<GridPos> {
        if self.tile <= 0.0 {
            return None;
        }
        let ui_y = match space {
            Space::TopLeft => point.y,
            Space::BottomLeft => self.viewport.height - point.y,
        };
        if !self.board_rect(Space::TopLeft).contains(Point::new(point.x, ui_y)) {
            return None;
        }
        let x = ((point.x - self.origin.x) / self.tile).floor() as i32;
        let y = ((ui_y - self.origin.y) / self.tile).floor() as i32;
        Some(GridPos::new(x, y))
    }
}
