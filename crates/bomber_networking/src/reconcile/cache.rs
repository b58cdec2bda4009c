//! Engine-owned bookkeeping: which keys have a live render handle, and which
//! explosion cells have already played their effect.

use std::collections::BTreeMap;

use bomber_shared::{CellKey, CellKeySet};

use super::ops::{PlayerView, RenderHandle};
use crate::snapshot::PlayerId;

/// Key → handle maps plus the animated-explosion set.
///
/// Single writer. Ordered maps so the op stream is deterministic.
#[derive(Debug, Default)]
pub struct ReconciliationCache {
    next_handle: u64,
    pub(super) players: BTreeMap<PlayerId, (RenderHandle, PlayerView)>,
    pub(super) bombs: BTreeMap<CellKey, RenderHandle>,
    pub(super) animated: CellKeySet,
}

impl ReconciliationCache {
    /// Empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn allocate(&mut self) -> RenderHandle {
        self.next_handle += 1;
        RenderHandle::from_raw(self.next_handle)
    }

    /// Remote players with a live handle.
    pub fn player_ids(&self) -> impl Iterator<Item = &PlayerId> + '_ {
        self.players.keys()
    }

    /// Bombs with a live handle.
    pub fn bomb_keys(&self) -> impl Iterator<Item = CellKey> + '_ {
        self.bombs.keys().copied()
    }

    /// Explosion cells whose effect has already fired.
    #[inline]
    #[must_use]
    pub const fn animated_explosions(&self) -> &CellKeySet {
        &self.animated
    }

    /// Handle for a remote player.
    #[must_use]
    pub fn player_handle(&self, id: &PlayerId) -> Option<RenderHandle> {
        self.players.get(id).map(|(h, _)| *h)
    }

    /// Handle for a bomb.
    #[must_use]
    pub fn bomb_handle(&self, key: CellKey) -> Option<RenderHandle> {
        self.bombs.get(&key).copied()
    }

    /// Number of live handles.
    #[must_use]
    pub fn live_handles(&self) -> usize {
        self.players.len() + self.bombs.len()
    }

    /// Drops all entries. Handles keep counting up.
    pub fn clear(&mut self) {
        self.players.clear();
        self.bombs.clear();
        self.animated = CellKeySet::new();
    }
}
