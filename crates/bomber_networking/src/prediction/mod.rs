//! # Local Prediction
//!
//! The controlled player's position and the client's working copy of the
//! grid.
//!
//! ## How It Works
//!
//! 1. Input arrives; the step is checked against the working grid
//! 2. If walkable, the predicted position advances immediately
//! 3. The `move` command goes to the server regardless
//! 4. The next snapshot reports the authoritative position
//! 5. That position is adopted unless the working grid says it is
//!    unreachable (stale or out-of-order packet)
//!
//! ```text
//! Input:     [→] [→]
//!             │   │
//! Predicted: (2,1)(3,1)
//!                     │
//! Snapshot:          (3,1) ── walkable ── adopt
//! Snapshot:          (5,5) ── "#" ─────── reject, keep (3,1)
//! ```
//!
//! The working grid is shared with the snapshot it came from until a
//! speculative blast writes to it; only then is it copied.

use std::sync::Arc;

use bomber_shared::{BlastPolicy, Direction, Grid, GridPos};

/// Result of reconciling the predicted position with a snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PositionOutcome {
    /// Adopted a different position or liveness.
    Moved {
        /// New position.
        position: GridPos,
        /// New liveness.
        alive: bool,
        /// Exactly one orthogonal step from the previous position, so the
        /// sink may animate it instead of jumping.
        adjacent: bool,
    },
    /// Snapshot agrees with the prediction.
    Unchanged,
    /// Snapshot position is not walkable in the working grid; prediction kept.
    Rejected {
        /// What the server reported.
        reported: GridPos,
    },
}

/// Locally-owned movable state.
#[derive(Clone, Debug, Default)]
pub struct LocalPrediction {
    grid: Arc<Grid>,
    position: Option<GridPos>,
    alive: bool,
}

impl LocalPrediction {
    /// No grid, no position.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Working grid.
    #[inline]
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Predicted position, once known.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> Option<GridPos> {
        self.position
    }

    /// Last known liveness.
    #[inline]
    #[must_use]
    pub const fn alive(&self) -> bool {
        self.alive
    }

    /// Advances the prediction one step if the target cell is walkable.
    ///
    /// Returns the new position, or `None` when there is nothing to move
    /// (no position yet, dead, or blocked).
    pub fn try_step(&mut self, direction: Direction) -> Option<GridPos> {
        let from = self.position?;
        if !self.alive {
            return None;
        }
        let to = from.step(direction);
        if !self.grid.is_walkable(to) {
            return None;
        }
        self.position = Some(to);
        Some(to)
    }

    /// Reconciles with the authoritative position.
    ///
    /// Call before [`adopt_grid`](Self::adopt_grid) so that walkability is
    /// judged against the grid the prediction was made on.
    pub fn reconcile(&mut self, reported: GridPos, alive: bool) -> PositionOutcome {
        if !self.grid.is_empty() && !self.grid.is_walkable(reported) {
            return PositionOutcome::Rejected { reported };
        }
        if self.position == Some(reported) && self.alive == alive {
            return PositionOutcome::Unchanged;
        }

        let adjacent = self.position.is_some_and(|from| {
            (from.x - reported.x).abs() + (from.y - reported.y).abs() == 1
        });
        self.position = Some(reported);
        self.alive = alive;
        PositionOutcome::Moved { position: reported, alive, adjacent }
    }

    /// Replaces the working grid wholesale with an authoritative one.
    ///
    /// Returns true when the contents differ from what was there, which
    /// includes discarding any speculative clearing.
    pub fn adopt_grid(&mut self, grid: Arc<Grid>) -> bool {
        let changed = *self.grid != *grid;
        self.grid = grid;
        changed
    }

    /// Speculatively clears destructible walls around `center` in the
    /// working grid. Returns the cleared cells; empty when nothing changed.
    pub fn detonate(&mut self, center: GridPos, policy: BlastPolicy) -> Vec<GridPos> {
        if !self.grid.in_bounds(center) {
            return Vec::new();
        }
        Arc::make_mut(&mut self.grid).clear_blast(center, policy)
    }

    /// Drops the position but keeps the working grid.
    ///
    /// Returns the position that was known, if any.
    pub fn forget_position(&mut self) -> Option<GridPos> {
        self.alive = false;
        self.position.take()
    }

    /// Forgets everything.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bomber_shared::Cell;

    const BOARD: &str = "\
#######
#     #
# # # #
#  .  #
#######";

    fn primed(at: GridPos) -> LocalPrediction {
        let mut local = LocalPrediction::new();
        local.adopt_grid(Arc::new(Grid::parse(BOARD)));
        assert!(matches!(local.reconcile(at, true), PositionOutcome::Moved { .. }));
        local
    }

    #[test]
    fn test_first_position_accepted_on_empty_grid() {
        let mut local = LocalPrediction::new();
        let outcome = local.reconcile(GridPos::new(9, 9), true);
        assert_eq!(
            outcome,
            PositionOutcome::Moved { position: GridPos::new(9, 9), alive: true, adjacent: false }
        );
    }

    #[test]
    fn test_step_into_floor() {
        let mut local = primed(GridPos::new(1, 1));
        assert_eq!(local.try_step(Direction::Right), Some(GridPos::new(2, 1)));
        assert_eq!(local.position(), Some(GridPos::new(2, 1)));
    }

    #[test]
    fn test_step_blocked_by_walls() {
        let mut local = primed(GridPos::new(1, 1));
        assert_eq!(local.try_step(Direction::Up), None);
        assert_eq!(local.try_step(Direction::Left), None);

        let mut local = primed(GridPos::new(2, 3));
        assert_eq!(local.try_step(Direction::Right), None, "destructible wall blocks");
        assert_eq!(local.position(), Some(GridPos::new(2, 3)));
    }

    #[test]
    fn test_dead_player_cannot_step() {
        let mut local = primed(GridPos::new(1, 1));
        local.reconcile(GridPos::new(1, 1), false);
        assert_eq!(local.try_step(Direction::Right), None);
    }

    #[test]
    fn test_reject_unwalkable_report() {
        let mut local = primed(GridPos::new(1, 1));
        let outcome = local.reconcile(GridPos::new(2, 2), true);
        assert_eq!(outcome, PositionOutcome::Rejected { reported: GridPos::new(2, 2) });
        assert_eq!(local.position(), Some(GridPos::new(1, 1)));

        let outcome = local.reconcile(GridPos::new(40, 1), true);
        assert!(matches!(outcome, PositionOutcome::Rejected { .. }));
    }

    #[test]
    fn test_unchanged_and_adjacent() {
        let mut local = primed(GridPos::new(1, 1));
        assert_eq!(local.reconcile(GridPos::new(1, 1), true), PositionOutcome::Unchanged);
        assert_eq!(
            local.reconcile(GridPos::new(1, 2), true),
            PositionOutcome::Moved { position: GridPos::new(1, 2), alive: true, adjacent: true }
        );
        assert_eq!(
            local.reconcile(GridPos::new(5, 1), true),
            PositionOutcome::Moved { position: GridPos::new(5, 1), alive: true, adjacent: false }
        );
    }

    #[test]
    fn test_detonate_copies_on_write() {
        let shared = Arc::new(Grid::parse(BOARD));
        let mut local = LocalPrediction::new();
        local.adopt_grid(Arc::clone(&shared));

        let cleared = local.detonate(GridPos::new(2, 3), BlastPolicy::UntilObstacle);
        assert_eq!(cleared, vec![GridPos::new(3, 3)]);
        assert_eq!(local.grid().get(GridPos::new(3, 3)), Some(Cell::Empty));
        assert_eq!(shared.get(GridPos::new(3, 3)), Some(Cell::DestructibleWall));

        assert!(local.adopt_grid(shared), "authoritative grid supersedes speculation");
        assert_eq!(local.grid().get(GridPos::new(3, 3)), Some(Cell::DestructibleWall));
    }

    #[test]
    fn test_detonate_outside_grid() {
        let mut local = LocalPrediction::new();
        assert!(local.detonate(GridPos::new(0, 0), BlastPolicy::UntilObstacle).is_empty());
    }
}
