//! # Snapshot Model
//!
//! One server-authoritative frame, converted once from its wire shape into
//! domain values and then never mutated.
//!
//! ```text
//! SnapshotWire (strings, raw coords)
//!        │  Snapshot::from_wire
//!        ▼
//! Snapshot { round, Arc<Grid>, players, bombs: CellKeySet, explosions: CellKeySet, .. }
//!        │  Arc<Snapshot>
//!        ▼
//! every observer (engine, round tracker, ...)
//! ```
//!
//! Each snapshot fully replaces the previous one. There is no delta on the
//! wire; the reconciliation engine computes it.

use std::fmt;
use std::sync::Arc;

use bomber_shared::{CellKeySet, Grid, GridPos, PlayerWire, RoundState, SnapshotWire};

/// Server-assigned player identifier. Opaque, stable for one connection.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlayerId(String);

impl PlayerId {
    /// Wraps a raw identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// One roster entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerRecord {
    /// Identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Cell the player stands on.
    pub pos: GridPos,
    /// Still in the round.
    pub alive: bool,
    /// Declared ready in the lobby.
    pub ready: bool,
}

impl From<PlayerWire> for PlayerRecord {
    fn from(wire: PlayerWire) -> Self {
        Self {
            id: PlayerId(wire.id),
            name: wire.name,
            pos: GridPos::new(wire.x, wire.y),
            alive: wire.alive,
            ready: wire.ready,
        }
    }
}

/// An immutable authoritative frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    round: RoundState,
    grid: Arc<Grid>,
    players: Vec<PlayerRecord>,
    bombs: CellKeySet,
    explosions: CellKeySet,
    time_remaining: Option<f64>,
    winner: Option<PlayerId>,
}

impl Snapshot {
    /// Converts a decoded wire frame.
    ///
    /// Duplicate bomb or explosion cells are collapsed here and nowhere else.
    #[must_use]
    pub fn from_wire(wire: SnapshotWire) -> Self {
        let (bombs, dup_bombs) = CellKeySet::collect(wire.bombs.iter().map(|c| c.pos()));
        let (explosions, dup_explosions) =
            CellKeySet::collect(wire.explosions.iter().map(|c| c.pos()));
        if dup_bombs + dup_explosions > 0 {
            tracing::warn!(
                dup_bombs,
                dup_explosions,
                "snapshot repeats a cell key; duplicates collapsed"
            );
        }

        Self {
            round: wire.state,
            grid: Arc::new(Grid::from_symbols(&wire.map)),
            players: wire.players.into_iter().map(PlayerRecord::from).collect(),
            bombs,
            explosions,
            time_remaining: wire.time_remaining,
            winner: wire.winner.map(PlayerId),
        }
    }

    /// Starts a builder, mostly for tests and fixtures.
    #[must_use]
    pub fn builder(round: RoundState) -> SnapshotBuilder {
        SnapshotBuilder::new(round)
    }

    /// False while the grid has no cells; such a frame carries no positional
    /// information the client can use.
    #[inline]
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        !self.grid.is_empty()
    }

    /// Round phase.
    #[inline]
    #[must_use]
    pub const fn round(&self) -> RoundState {
        self.round
    }

    /// The board.
    #[inline]
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Shared handle to the board, so consumers can adopt it without a copy.
    #[inline]
    #[must_use]
    pub fn grid_arc(&self) -> Arc<Grid> {
        Arc::clone(&self.grid)
    }

    /// Roster in server order.
    #[inline]
    #[must_use]
    pub fn players(&self) -> &[PlayerRecord] {
        &self.players
    }

    /// Looks up one player.
    #[must_use]
    pub fn player(&self, id: &PlayerId) -> Option<&PlayerRecord> {
        self.players.iter().find(|p| &p.id == id)
    }

    /// Armed bombs.
    #[inline]
    #[must_use]
    pub const fn bombs(&self) -> &CellKeySet {
        &self.bombs
    }

    /// Cells currently exploding.
    #[inline]
    #[must_use]
    pub const fn explosions(&self) -> &CellKeySet {
        &self.explosions
    }

    /// Seconds left in the round.
    #[inline]
    #[must_use]
    pub const fn time_remaining(&self) -> Option<f64> {
        self.time_remaining
    }

    /// Winner once the round is over.
    #[inline]
    #[must_use]
    pub const fn winner(&self) -> Option<&PlayerId> {
        self.winner.as_ref()
    }
}

/// Fluent constructor for [`Snapshot`].
#[derive(Debug)]
pub struct SnapshotBuilder {
    inner: Snapshot,
}

impl SnapshotBuilder {
    fn new(round: RoundState) -> Self {
        Self {
            inner: Snapshot {
                round,
                grid: Arc::new(Grid::empty()),
                players: Vec::new(),
                bombs: CellKeySet::new(),
                explosions: CellKeySet::new(),
                time_remaining: None,
                winner: None,
            },
        }
    }

    /// Sets the board.
    #[must_use]
    pub fn grid(mut self, grid: Grid) -> Self {
        self.inner.grid = Arc::new(grid);
        self
    }

    /// Adds a player.
    #[must_use]
    pub fn player(mut self, id: &str, name: &str, pos: GridPos, alive: bool) -> Self {
        self.inner.players.push(PlayerRecord {
            id: PlayerId::new(id),
            name: name.to_owned(),
            pos,
            alive,
            ready: false,
        });
        self
    }

    /// Adds a bomb.
    #[must_use]
    pub fn bomb(mut self, pos: GridPos) -> Self {
        self.inner.bombs.insert(pos.into());
        self
    }

    /// Adds an exploding cell.
    #[must_use]
    pub fn explosion(mut self, pos: GridPos) -> Self {
        self.inner.explosions.insert(pos.into());
        self
    }

    /// Sets the clock.
    #[must_use]
    pub const fn time_remaining(mut self, seconds: f64) -> Self {
        self.inner.time_remaining = Some(seconds);
        self
    }

    /// Sets the winner.
    #[must_use]
    pub fn winner(mut self, id: &str) -> Self {
        self.inner.winner = Some(PlayerId::new(id));
        self
    }

    /// Finishes the snapshot.
    #[must_use]
    pub fn build(self) -> Snapshot {
        self.inner
    }
}
