//! Wall tile styling.
//!
//! A wall is drawn as a horizontal or vertical segment depending on its
//! indestructible neighbours; destructible walls are drawn dimmed.

use bomber_shared::{Cell, Direction, Grid, GridPos};

/// Opacity of destructible walls.
pub const DESTRUCTIBLE_ALPHA: f32 = 0.5;

/// Segment direction of a wall sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Runs left-right.
    Horizontal,
    /// Runs up-down.
    Vertical,
}

/// How to draw one wall tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileStyle {
    /// Wall kind.
    pub cell: Cell,
    /// Segment direction.
    pub orientation: Orientation,
    /// Opacity in `0..=1`.
    pub alpha: f32,
}

/// Style for the tile at `pos`, or `None` for floor.
///
/// Horizontal when an indestructible wall is to the left or right, unless
/// there are indestructible walls both above and below.
#[must_use]
pub fn style_for(grid: &Grid, pos: GridPos) -> Option<TileStyle> {
    let cell = grid.get(pos)?;
    let alpha = match cell {
        Cell::Empty => return None,
        Cell::IndestructibleWall => 1.0,
        Cell::DestructibleWall => DESTRUCTIBLE_ALPHA,
    };
    let solid = |d: Direction| grid.get(pos.step(d)) == Some(Cell::IndestructibleWall);
    let sideways = solid(Direction::Left) || solid(Direction::Right);
    let stacked = solid(Direction::Up) && solid(Direction::Down);
    let orientation = if sideways && !stacked {
        Orientation::Horizontal
    } else {
        Orientation::Vertical
    };
    Some(TileStyle { cell, orientation, alpha })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOARD: &str = "\
#####
#.  #
# # #
#####";

    fn orientation(grid: &Grid, x: i32, y: i32) -> Orientation {
        style_for(grid, GridPos::new(x, y)).map(|s| s.orientation).unwrap()
    }

    #[test]
    fn test_floor_has_no_style() {
        let grid = Grid::parse(BOARD);
        assert!(style_for(&grid, GridPos::new(2, 1)).is_none());
        assert!(style_for(&grid, GridPos::new(9, 9)).is_none());
    }

    #[test]
    fn test_border_orientation() {
        let grid = Grid::parse(BOARD);
        assert_eq!(orientation(&grid, 2, 0), Orientation::Horizontal);
        assert_eq!(orientation(&grid, 0, 2), Orientation::Vertical);
        // Corner: neighbour to the right, nothing above.
        assert_eq!(orientation(&grid, 0, 0), Orientation::Horizontal);
        // Lone pillar: nothing left or right.
        assert_eq!(orientation(&grid, 2, 2), Orientation::Vertical);
    }

    #[test]
    fn test_stacked_beats_sideways() {
        let grid = Grid::parse("###\n## \n###");
        assert_eq!(orientation(&grid, 1, 1), Orientation::Vertical);
        assert_eq!(orientation(&grid, 1, 0), Orientation::Horizontal);
    }

    #[test]
    fn test_destructible_is_dimmed() {
        let grid = Grid::parse(BOARD);
        let style = style_for(&grid, GridPos::new(1, 1)).unwrap();
        assert_eq!(style.cell, Cell::DestructibleWall);
        assert!((style.alpha - DESTRUCTIBLE_ALPHA).abs() < f32::EPSILON);
        assert_eq!(style.orientation, Orientation::Horizontal);
    }
}
