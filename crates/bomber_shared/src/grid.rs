//! # Tile Grid
//!
//! The board is a fixed-size 2-D array of [`Cell`]s, row-major, `(0, 0)` at
//! the top-left. Dimensions never change within a round; only destruction
//! mutates it.
//!
//! ```text
//!        x →
//!      ┌───┬───┬───┬───┐
//!  y   │ # │ # │ # │ # │     # = indestructible wall
//!  ↓   ├───┼───┼───┼───┤     . = destructible wall
//!      │ # │   │ . │ # │       = walkable
//!      └───┴───┴───┴───┘
//! ```
//!
//! Bombs and explosions have no server identity. Their identity is the cell
//! they occupy, wrapped in [`CellKey`] so the "at most one per cell" rule is
//! enforced in exactly one place ([`CellKeySet`]).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::constants::{SYMBOL_DESTRUCTIBLE, SYMBOL_EMPTY, SYMBOL_INDESTRUCTIBLE};

/// One board cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Cell {
    /// Walkable floor.
    #[default]
    Empty,
    /// Permanent wall.
    IndestructibleWall,
    /// Wall that a blast can clear.
    DestructibleWall,
}

impl Cell {
    /// Parses a server cell symbol. Anything that is not a wall is walkable.
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Self {
        match symbol {
            SYMBOL_INDESTRUCTIBLE => Self::IndestructibleWall,
            SYMBOL_DESTRUCTIBLE => Self::DestructibleWall,
            _ => Self::Empty,
        }
    }

    /// Returns the canonical symbol for this cell.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Empty => SYMBOL_EMPTY,
            Self::IndestructibleWall => SYMBOL_INDESTRUCTIBLE,
            Self::DestructibleWall => SYMBOL_DESTRUCTIBLE,
        }
    }

    /// True for floor cells.
    #[inline]
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        matches!(self, Self::Empty)
    }

    /// True for either kind of wall.
    #[inline]
    #[must_use]
    pub const fn is_wall(self) -> bool {
        !self.is_walkable()
    }
}

/// A grid coordinate. Signed so that neighbour arithmetic can step off the
/// board and be rejected by a bounds check instead of wrapping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridPos {
    /// Column.
    pub x: i32,
    /// Row (grows downwards).
    pub y: i32,
}

impl GridPos {
    /// Creates a position.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring cell one step in `direction`.
    #[inline]
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self::new(self.x + dx, self.y + dy)
    }
}

/// One orthogonal step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// `dy = -1`
    Up,
    /// `dy = +1`
    Down,
    /// `dx = -1`
    Left,
    /// `dx = +1`
    Right,
}

impl Direction {
    /// All four directions, in blast-propagation order.
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// `(dx, dy)` for this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    /// Inverse of [`Direction::delta`]; `None` unless exactly one axis is ±1.
    #[must_use]
    pub const fn from_delta(dx: i32, dy: i32) -> Option<Self> {
        match (dx, dy) {
            (0, -1) => Some(Self::Up),
            (0, 1) => Some(Self::Down),
            (-1, 0) => Some(Self::Left),
            (1, 0) => Some(Self::Right),
            _ => None,
        }
    }
}

/// Synthesized identity of a bomb or explosion: the cell it occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellKey(GridPos);

impl CellKey {
    /// Key for the cell at `(x, y)`.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self(GridPos::new(x, y))
    }

    /// The cell this key names.
    #[inline]
    #[must_use]
    pub const fn pos(self) -> GridPos {
        self.0
    }
}

impl From<GridPos> for CellKey {
    fn from(pos: GridPos) -> Self {
        Self(pos)
    }
}

/// A set of cell keys with at most one entry per cell.
///
/// Ordered, so that anything iterating it produces a deterministic sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CellKeySet {
    keys: BTreeSet<CellKey>,
}

impl CellKeySet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self { keys: BTreeSet::new() }
    }

    /// Builds a set from raw positions.
    ///
    /// Returns the set and the number of duplicate positions that were
    /// collapsed; a non-zero count means the server broke the one-per-cell
    /// rule and the caller should log it.
    #[must_use]
    pub fn collect(positions: impl IntoIterator<Item = GridPos>) -> (Self, usize) {
        let mut keys = BTreeSet::new();
        let mut duplicates = 0;
        for pos in positions {
            if !keys.insert(CellKey::from(pos)) {
                duplicates += 1;
            }
        }
        (Self { keys }, duplicates)
    }

    /// Inserts a key; returns false if the cell was already present.
    pub fn insert(&mut self, key: CellKey) -> bool {
        self.keys.insert(key)
    }

    /// True if the cell is present.
    #[must_use]
    pub fn contains(&self, key: CellKey) -> bool {
        self.keys.contains(&key)
    }

    /// Keeps only the keys matching `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(CellKey) -> bool) {
        self.keys.retain(|k| keep(*k));
    }

    /// Iterates keys in `(x, y)` order.
    pub fn iter(&self) -> impl Iterator<Item = CellKey> + '_ {
        self.keys.iter().copied()
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl FromIterator<CellKey> for CellKeySet {
    fn from_iter<T: IntoIterator<Item = CellKey>>(iter: T) -> Self {
        Self { keys: iter.into_iter().collect() }
    }
}

/// How a speculative blast propagates from the bomb cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlastPolicy {
    /// Per direction, clear the contiguous run of destructible walls that
    /// starts at the adjacent cell; stop at the first cell that is not one.
    #[default]
    UntilObstacle,
    /// Per direction, travel up to `n` cells through floor; clear the first
    /// destructible wall met and stop there; stop at indestructible walls.
    Fixed(u32),
}

/// The board.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Grid {
    cells: Vec<Cell>,
    cols: usize,
    rows: usize,
}

impl Grid {
    /// A grid with no cells ("not yet initialized").
    #[must_use]
    pub const fn empty() -> Self {
        Self { cells: Vec::new(), cols: 0, rows: 0 }
    }

    /// A `cols x rows` grid filled with `cell`.
    #[must_use]
    pub fn filled(cols: usize, rows: usize, cell: Cell) -> Self {
        Self { cells: vec![cell; cols * rows], cols, rows }
    }

    /// Builds a grid from the server's row-major symbol matrix.
    ///
    /// The width is the longest row. Cells missing from a short row are
    /// treated as indestructible so nothing can be predicted onto them.
    #[must_use]
    pub fn from_symbols<R, S>(rows: &[R]) -> Self
    where
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        let cols = rows.iter().map(|r| r.as_ref().len()).max().unwrap_or(0);
        if cols == 0 {
            return Self::empty();
        }
        let mut cells = Vec::with_capacity(cols * rows.len());
        for row in rows {
            let row = row.as_ref();
            cells.extend(row.iter().map(|s| Cell::from_symbol(s.as_ref())));
            cells.extend(std::iter::repeat(Cell::IndestructibleWall).take(cols - row.len()));
        }
        Self { cells, cols, rows: rows.len() }
    }

    /// Parses a compact text board, one line per row, one char per cell.
    /// Handy for tests and fixtures.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let rows: Vec<Vec<String>> = text
            .lines()
            .filter(|l| !l.is_empty())
            .map(|l| l.chars().map(String::from).collect())
            .collect();
        Self::from_symbols(&rows)
    }

    /// True when the grid has no cells.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cols == 0 || self.rows == 0
    }

    /// Number of columns.
    #[inline]
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Number of rows.
    #[inline]
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// True if `pos` lies on the board.
    #[inline]
    #[must_use]
    pub fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.cols && (pos.y as usize) < self.rows
    }

    fn index(&self, pos: GridPos) -> Option<usize> {
        self.in_bounds(pos).then(|| pos.y as usize * self.cols + pos.x as usize)
    }

    /// The cell at `pos`, or `None` off the board.
    #[must_use]
    pub fn get(&self, pos: GridPos) -> Option<Cell> {
        self.index(pos).map(|i| self.cells[i])
    }

    /// True if `pos` is on the board and walkable.
    #[must_use]
    pub fn is_walkable(&self, pos: GridPos) -> bool {
        self.get(pos).is_some_and(Cell::is_walkable)
    }

    /// Overwrites a cell. Returns false (and does nothing) off the board.
    pub fn set(&mut self, pos: GridPos, cell: Cell) -> bool {
        match self.index(pos) {
            Some(i) => {
                self.cells[i] = cell;
                true
            }
            None => false,
        }
    }

    /// Iterates `(pos, cell)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (GridPos, Cell)> + '_ {
        let cols = self.cols.max(1);
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, c)| (GridPos::new((i % cols) as i32, (i / cols) as i32), *c))
    }

    /// Clears destructible walls around `center` according to `policy` and
    /// returns every cell that changed, center first.
    pub fn clear_blast(&mut self, center: GridPos, policy: BlastPolicy) -> Vec<GridPos> {
        let mut cleared = Vec::new();
        if !self.in_bounds(center) {
            return cleared;
        }
        if self.get(center) == Some(Cell::DestructibleWall) {
            self.set(center, Cell::Empty);
            cleared.push(center);
        }

        for direction in Direction::ALL {
            let mut pos = center.step(direction);
            let mut travelled = 0u32;
            while let Some(cell) = self.get(pos) {
                match policy {
                    BlastPolicy::UntilObstacle => {
                        if cell != Cell::DestructibleWall {
                            break;
                        }
                        self.set(pos, Cell::Empty);
                        cleared.push(pos);
                    }
                    BlastPolicy::Fixed(range) => {
                        travelled += 1;
                        if travelled > range || cell == Cell::IndestructibleWall {
                            break;
                        }
                        if cell == Cell::DestructibleWall {
                            self.set(pos, Cell::Empty);
                            cleared.push(pos);
                            break;
                        }
                    }
                }
                pos = pos.step(direction);
            }
        }
        cleared
    }
}
