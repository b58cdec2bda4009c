//! # Reconciliation Engine
//!
//! Turns a stream of full snapshots into a minimal, idempotent stream of
//! render operations.
//!
//! ## One Cycle
//!
//! ```text
//! Snapshot N
//!    │
//!    ├─ uninitialised grid? ───────────────────────────► (no ops)
//!    │
//!    ├─ 1. local player   reconcile vs working grid ──► MoveLocalPlayer
//!    │                    absent from roster ─────────► RemoveLocalPlayer
//!    ├─ 2. grid           swap wholesale ─────────────► ReplaceGrid
//!    ├─ 3. explosions     first sighting only ────────► AnimateExplosion
//!    │                    + pre-empt bomb on same cell ► RemoveBomb
//!    │                    evict keys no longer present
//!    ├─ 4. bombs          (bombs − explosions) ───────► Remove / Create / Update
//!    └─ 5. remote players roster − local id ──────────► Remove / Create / Update
//! ```
//!
//! Within a class, removes always precede creates. Feeding the same snapshot
//! twice yields only updates the second time, each equal to the last one.
//!
//! ## Identity
//!
//! Players are keyed by server id. Bombs and explosions have no id, so they
//! are keyed by cell ([`CellKey`]). An explosion that stays on a cell across
//! snapshots is the same explosion; one that disappears for a single
//! snapshot and comes back is a new one.

mod cache;
mod ops;

pub use cache::ReconciliationCache;
pub use ops::{PlayerView, RenderHandle, RenderOp};

use std::collections::BTreeMap;
use std::sync::Arc;

use bomber_shared::{BlastPolicy, CellKey, CellKeySet, Direction, GridPos};

use crate::prediction::{LocalPrediction, PositionOutcome};
use crate::snapshot::{PlayerId, Snapshot};

/// Counters over the engine's lifetime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Snapshots that produced a cycle.
    pub cycles: u64,
    /// Snapshots skipped because their grid was empty.
    pub skipped_uninitialized: u64,
    /// Authoritative local positions rejected as unreachable.
    pub rejected_positions: u64,
    /// Explosion effects triggered.
    pub explosions_triggered: u64,
    /// Ops emitted in total.
    pub ops_emitted: u64,
}

/// Snapshot differ.
///
/// Owns the reconciliation cache and the local prediction; both are only
/// ever touched from the thread that calls into the engine.
#[derive(Debug, Default)]
pub struct ReconciliationEngine {
    local_id: Option<PlayerId>,
    previous: Option<Arc<Snapshot>>,
    cache: ReconciliationCache,
    local: LocalPrediction,
    stats: ReconcileStats,
}

impl ReconciliationEngine {
    /// Fresh engine with no local player.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the id of the controlled player. It is excluded from the remote
    /// roster from the next cycle on; a cached remote entry under that id is
    /// removed then.
    pub fn set_local_id(&mut self, id: PlayerId) {
        tracing::debug!(%id, "local player id set");
        self.local_id = Some(id);
    }

    /// Id of the controlled player.
    #[inline]
    #[must_use]
    pub const fn local_id(&self) -> Option<&PlayerId> {
        self.local_id.as_ref()
    }

    /// Last snapshot that produced a cycle.
    #[inline]
    #[must_use]
    pub const fn previous(&self) -> Option<&Arc<Snapshot>> {
        self.previous.as_ref()
    }

    /// Cache, for inspection.
    #[inline]
    #[must_use]
    pub const fn cache(&self) -> &ReconciliationCache {
        &self.cache
    }

    /// Local prediction, for inspection.
    #[inline]
    #[must_use]
    pub const fn local(&self) -> &LocalPrediction {
        &self.local
    }

    /// Lifetime counters.
    #[inline]
    #[must_use]
    pub const fn stats(&self) -> ReconcileStats {
        self.stats
    }

    /// Runs one reconciliation cycle.
    pub fn apply(&mut self, snapshot: Arc<Snapshot>) -> Vec<RenderOp> {
        if !snapshot.is_initialized() {
            self.stats.skipped_uninitialized += 1;
            tracing::trace!(round = ?snapshot.round(), "snapshot without grid; skipped");
            return Vec::new();
        }

        let mut ops = Vec::new();
        self.reconcile_local(&snapshot, &mut ops);
        if self.local.adopt_grid(snapshot.grid_arc()) {
            tracing::debug!(
                cols = snapshot.grid().cols(),
                rows = snapshot.grid().rows(),
                "grid replaced"
            );
            ops.push(RenderOp::ReplaceGrid { grid: snapshot.grid_arc() });
        }
        let explosions = self.reconcile_explosions(&snapshot, &mut ops);
        self.reconcile_bombs(&snapshot, &explosions, &mut ops);
        self.reconcile_players(&snapshot, &mut ops);

        self.stats.cycles += 1;
        self.stats.ops_emitted += ops.len() as u64;
        self.previous = Some(snapshot);
        ops
    }

    fn reconcile_local(&mut self, snapshot: &Snapshot, ops: &mut Vec<RenderOp>) {
        let Some(id) = self.local_id.as_ref() else {
            return;
        };
        let Some(record) = snapshot.player(id) else {
            if let Some(last) = self.local.forget_position() {
                tracing::debug!(%id, ?last, "local player left the snapshot");
                ops.push(RenderOp::RemoveLocalPlayer);
            }
            return;
        };
        if !snapshot.grid().in_bounds(record.pos) {
            self.stats.rejected_positions += 1;
            tracing::debug!(pos = ?record.pos, "local position outside grid; ignored");
            return;
        }
        match self.local.reconcile(record.pos, record.alive) {
            PositionOutcome::Moved { position, alive, adjacent } => {
                ops.push(RenderOp::MoveLocalPlayer { position, alive, animate: adjacent });
            }
            PositionOutcome::Unchanged => {}
            PositionOutcome::Rejected { reported } => {
                self.stats.rejected_positions += 1;
                tracing::debug!(
                    ?reported,
                    kept = ?self.local.position(),
                    "local position unreachable in working grid; rejected"
                );
            }
        }
    }

    /// Returns the in-bounds explosion keys of this snapshot.
    fn reconcile_explosions(&mut self, snapshot: &Snapshot, ops: &mut Vec<RenderOp>) -> CellKeySet {
        let present = in_bounds(snapshot, snapshot.explosions(), "explosion");

        for key in present.iter() {
            if !self.cache.animated.insert(key) {
                continue;
            }
            self.stats.explosions_triggered += 1;
            tracing::trace!(?key, "explosion triggered");
            ops.push(RenderOp::AnimateExplosion { key });
            if let Some(handle) = self.cache.bombs.remove(&key) {
                ops.push(RenderOp::RemoveBomb { handle, key });
            }
        }
        self.cache.animated.retain(|key| present.contains(key));
        present
    }

    fn reconcile_bombs(
        &mut self,
        snapshot: &Snapshot,
        explosions: &CellKeySet,
        ops: &mut Vec<RenderOp>,
    ) {
        let mut present = in_bounds(snapshot, snapshot.bombs(), "bomb");
        present.retain(|key| !explosions.contains(key));

        let gone: Vec<CellKey> = self.cache.bomb_keys().filter(|k| !present.contains(*k)).collect();
        for key in gone {
            if let Some(handle) = self.cache.bombs.remove(&key) {
                ops.push(RenderOp::RemoveBomb { handle, key });
            }
        }

        let mut updates = Vec::new();
        for key in present.iter() {
            if let Some(&handle) = self.cache.bombs.get(&key) {
                updates.push(RenderOp::UpdateBomb { handle, key });
            } else {
                let handle = self.cache.allocate();
                self.cache.bombs.insert(key, handle);
                ops.push(RenderOp::CreateBomb { handle, key });
            }
        }
        ops.extend(updates);
    }

    fn reconcile_players(&mut self, snapshot: &Snapshot, ops: &mut Vec<RenderOp>) {
        let grid = snapshot.grid();
        let present: BTreeMap<&PlayerId, PlayerView> = snapshot
            .players()
            .iter()
            .filter(|p| Some(&p.id) != self.local_id.as_ref())
            .filter(|p| {
                let inside = grid.in_bounds(p.pos);
                if !inside {
                    tracing::debug!(id = %p.id, pos = ?p.pos, "player outside grid; treated as absent");
                }
                inside
            })
            .map(|p| (&p.id, PlayerView::from(p)))
            .collect();

        let gone: Vec<PlayerId> = self
            .cache
            .player_ids()
            .filter(|id| !present.contains_key(id))
            .cloned()
            .collect();
        for id in gone {
            if let Some((handle, _)) = self.cache.players.remove(&id) {
                ops.push(RenderOp::RemovePlayer { handle, id });
            }
        }

        let mut updates = Vec::new();
        for (id, view) in present {
            if let Some((handle, last)) = self.cache.players.get_mut(id) {
                last.clone_from(&view);
                updates.push(RenderOp::UpdatePlayer { handle: *handle, view });
            } else {
                let handle = self.cache.allocate();
                self.cache.players.insert(id.clone(), (handle, view.clone()));
                ops.push(RenderOp::CreatePlayer { handle, view });
            }
        }
        ops.extend(updates);
    }

    /// Optimistically moves the controlled player one step.
    ///
    /// Returns the op to render the move, or `None` when the step is not
    /// possible in the working grid.
    pub fn predict_step(&mut self, direction: Direction) -> Option<RenderOp> {
        let position = self.local.try_step(direction)?;
        Some(RenderOp::MoveLocalPlayer { position, alive: true, animate: true })
    }

    /// Speculatively clears walls around `center` in the working grid.
    pub fn detonate(&mut self, center: GridPos, policy: BlastPolicy) -> Option<RenderOp> {
        let cells = self.local.detonate(center, policy);
        if cells.is_empty() {
            return None;
        }
        tracing::debug!(?center, cleared = cells.len(), "speculative blast applied");
        Some(RenderOp::ClearTiles { cells })
    }

    /// Forgets the session: cache, previous snapshot, prediction and local id.
    ///
    /// Returns removes for every live handle, and for the controlled player
    /// when its position was known, so the sink can free them.
    pub fn reset(&mut self) -> Vec<RenderOp> {
        let mut ops: Vec<RenderOp> = std::mem::take(&mut self.cache.bombs)
            .into_iter()
            .map(|(key, handle)| RenderOp::RemoveBomb { handle, key })
            .collect();
        ops.extend(
            std::mem::take(&mut self.cache.players)
                .into_iter()
                .map(|(id, (handle, _))| RenderOp::RemovePlayer { handle, id }),
        );
        if self.local.position().is_some() {
            ops.push(RenderOp::RemoveLocalPlayer);
        }
        self.cache.clear();
        self.local.reset();
        self.previous = None;
        self.local_id = None;
        ops
    }
}

fn in_bounds(snapshot: &Snapshot, keys: &CellKeySet, what: &'static str) -> CellKeySet {
    let grid = snapshot.grid();
    keys.iter()
        .filter(|key| {
            let inside = grid.in_bounds(key.pos());
            if !inside {
                tracing::debug!(?key, what, "cell outside grid; treated as absent");
            }
            inside
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bomber_shared::{Grid, RoundState};

    const BOARD: &str = "\
#######
#     #
# #.# #
#     #
#######";

    fn base() -> crate::snapshot::SnapshotBuilder {
        Snapshot::builder(RoundState::InProgress).grid(Grid::parse(BOARD))
    }

    fn count(ops: &[RenderOp], pred: impl Fn(&RenderOp) -> bool) -> usize {
        ops.iter().filter(|op| pred(op)).count()
    }

    #[test]
    fn test_uninitialized_snapshot_is_ignored() {
        let mut engine = ReconciliationEngine::new();
        let snap = Snapshot::builder(RoundState::Waiting).bomb(GridPos::new(1, 1)).build();
        assert!(engine.apply(Arc::new(snap)).is_empty());
        assert!(engine.previous().is_none());
        assert_eq!(engine.cache().live_handles(), 0);
        assert_eq!(engine.stats().skipped_uninitialized, 1);
    }

    #[test]
    fn test_first_snapshot_replaces_grid_and_creates() {
        let mut engine = ReconciliationEngine::new();
        let snap = base()
            .bomb(GridPos::new(1, 1))
            .player("b", "Bob", GridPos::new(5, 3), true)
            .build();
        let ops = engine.apply(Arc::new(snap));
        assert!(matches!(ops[0], RenderOp::ReplaceGrid { .. }));
        assert_eq!(count(&ops, RenderOp::is_create), 2);
    }

    #[test]
    fn test_local_player_excluded_from_remote_roster() {
        let mut engine = ReconciliationEngine::new();
        engine.set_local_id("a".into());
        let snap = base()
            .player("a", "Ann", GridPos::new(1, 1), true)
            .player("b", "Bob", GridPos::new(5, 3), true)
            .build();
        let ops = engine.apply(Arc::new(snap));

        assert!(ops.contains(&RenderOp::MoveLocalPlayer {
            position: GridPos::new(1, 1),
            alive: true,
            animate: false
        }));
        let remote: Vec<_> = engine.cache().player_ids().map(PlayerId::as_str).collect();
        assert_eq!(remote, vec!["b"]);
    }

    #[test]
    fn test_role_flip_removes_before_local_takes_over() {
        let mut engine = ReconciliationEngine::new();
        let snap = Arc::new(base().player("a", "Ann", GridPos::new(1, 1), true).build());
        engine.apply(Arc::clone(&snap));
        assert!(engine.cache().player_handle(&"a".into()).is_some());

        engine.set_local_id("a".into());
        let ops = engine.apply(snap);
        assert_eq!(count(&ops, |op| matches!(op, RenderOp::RemovePlayer { .. })), 1);
        assert_eq!(count(&ops, RenderOp::is_create), 0);
        assert_eq!(engine.cache().live_handles(), 0);
    }

    #[test]
    fn test_same_cell_bomb_and_explosion() {
        let mut engine = ReconciliationEngine::new();
        let cell = GridPos::new(2, 1);
        let snap = Arc::new(base().bomb(cell).explosion(cell).build());
        let ops = engine.apply(Arc::clone(&snap));
        assert_eq!(count(&ops, RenderOp::is_one_shot), 1);
        assert_eq!(count(&ops, RenderOp::is_create), 0, "exploding cell hides the bomb");

        let ops = engine.apply(snap);
        assert!(ops.is_empty());
    }

    #[test]
    fn test_out_of_bounds_entities_are_absent() {
        let mut engine = ReconciliationEngine::new();
        engine.apply(Arc::new(base().player("b", "Bob", GridPos::new(1, 1), true).build()));

        let snap = base()
            .bomb(GridPos::new(30, 1))
            .explosion(GridPos::new(-1, 0))
            .player("b", "Bob", GridPos::new(99, 99), true)
            .build();
        let ops = engine.apply(Arc::new(snap));
        assert_eq!(count(&ops, |op| matches!(op, RenderOp::RemovePlayer { .. })), 1);
        assert_eq!(count(&ops, RenderOp::is_create), 0);
        assert_eq!(count(&ops, RenderOp::is_one_shot), 0);
        assert!(engine.cache().animated_explosions().is_empty());
    }

    #[test]
    fn test_update_carries_latest_view() {
        let mut engine = ReconciliationEngine::new();
        engine.apply(Arc::new(base().player("b", "Bob", GridPos::new(1, 1), true).build()));
        let ops = engine.apply(Arc::new(base().player("b", "Bob", GridPos::new(1, 2), false).build()));
        let [RenderOp::UpdatePlayer { view, .. }] = ops.as_slice() else {
            panic!("expected a single update, got {ops:?}");
        };
        assert_eq!(view.pos, GridPos::new(1, 2));
        assert!(!view.alive);
    }

    #[test]
    fn test_handles_are_never_reused() {
        let mut engine = ReconciliationEngine::new();
        let cell = GridPos::new(1, 1);
        let first = engine.apply(Arc::new(base().bomb(cell).build()));
        engine.apply(Arc::new(base().build()));
        let second = engine.apply(Arc::new(base().bomb(cell).build()));

        let h1 = first.iter().find_map(RenderOp::handle);
        let h2 = second.iter().find_map(RenderOp::handle);
        assert!(h1.is_some() && h2.is_some());
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_predict_step_and_detonate() {
        let mut engine = ReconciliationEngine::new();
        engine.set_local_id("a".into());
        engine.apply(Arc::new(base().player("a", "Ann", GridPos::new(3, 1), true).build()));

        assert!(engine.predict_step(Direction::Up).is_none());
        assert!(engine.predict_step(Direction::Down).is_none(), "destructible wall");
        assert_eq!(
            engine.predict_step(Direction::Right),
            Some(RenderOp::MoveLocalPlayer { position: GridPos::new(4, 1), alive: true, animate: true })
        );

        let op = engine.detonate(GridPos::new(3, 1), BlastPolicy::UntilObstacle);
        assert_eq!(op, Some(RenderOp::ClearTiles { cells: vec![GridPos::new(3, 2)] }));
        assert!(engine.detonate(GridPos::new(3, 1), BlastPolicy::UntilObstacle).is_none());
    }

    #[test]
    fn test_reset_frees_everything() {
        let mut engine = ReconciliationEngine::new();
        engine.set_local_id("a".into());
        engine.apply(Arc::new(
            base()
                .bomb(GridPos::new(1, 1))
                .player("b", "Bob", GridPos::new(5, 3), true)
                .build(),
        ));
        let ops = engine.reset();
        assert_eq!(count(&ops, RenderOp::is_remove), 2);
        assert!(!ops.contains(&RenderOp::RemoveLocalPlayer), "local position was never known");
        assert_eq!(engine.cache().live_handles(), 0);
        assert!(engine.local_id().is_none());
        assert!(engine.local().position().is_none());
    }

    #[test]
    fn test_local_player_leaving_is_removed_once() {
        let mut engine = ReconciliationEngine::new();
        engine.set_local_id("me".into());
        engine.apply(Arc::new(
            base()
                .player("me", "Me", GridPos::new(1, 1), true)
                .player("b", "Bob", GridPos::new(5, 3), true)
                .build(),
        ));
        assert_eq!(engine.local().position(), Some(GridPos::new(1, 1)));

        let gone = Arc::new(base().player("b", "Bob", GridPos::new(5, 3), true).build());
        let ops = engine.apply(Arc::clone(&gone));
        assert_eq!(ops.first(), Some(&RenderOp::RemoveLocalPlayer));
        assert_eq!(count(&ops, |op| *op == RenderOp::RemoveLocalPlayer), 1);
        assert_eq!(count(&ops, RenderOp::is_remove), 0, "bob stays");
        assert!(engine.local().position().is_none());
        assert!(engine.predict_step(Direction::Right).is_none());

        let again = engine.apply(gone);
        assert!(!again.contains(&RenderOp::RemoveLocalPlayer));

        let back = engine.apply(Arc::new(base().player("me", "Me", GridPos::new(2, 1), true).build()));
        assert!(back.contains(&RenderOp::MoveLocalPlayer {
            position: GridPos::new(2, 1),
            alive: true,
            animate: false
        }));
    }

    #[test]
    fn test_reset_removes_known_local_player() {
        let mut engine = ReconciliationEngine::new();
        engine.set_local_id("me".into());
        engine.apply(Arc::new(
            base()
                .player("me", "Me", GridPos::new(1, 1), true)
                .player("b", "Bob", GridPos::new(5, 3), true)
                .build(),
        ));
        let ops = engine.reset();
        assert_eq!(count(&ops, |op| *op == RenderOp::RemoveLocalPlayer), 1);
        assert_eq!(count(&ops, RenderOp::is_remove), 1);
        assert!(engine.local().position().is_none());
        assert!(engine.reset().is_empty());
    }
}
