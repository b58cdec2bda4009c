//! # Round Tracker
//!
//! Follows the round phase across snapshots and reports transitions, so
//! screens react to "the round started" rather than re-deriving it from
//! every frame.
//!
//! ```text
//!            first WAITING
//!   (none) ───────────────► WAITING ──► IN_PROGRESS ──► GAME_OVER
//!                              ▲                            │
//!                              └────── ReturnedToLobby ─────┘
//! ```

use bomber_shared::RoundState;

use crate::snapshot::{PlayerId, PlayerRecord, Snapshot};

/// A round transition or lobby change.
#[derive(Clone, Debug, PartialEq)]
pub enum RoundEvent {
    /// First lobby snapshot of this connection.
    EnteredLobby,
    /// Lobby roster differs from the last one seen.
    RosterChanged(Vec<PlayerRecord>),
    /// Round went live.
    RoundStarted,
    /// Round finished.
    RoundOver {
        /// Winner, if the server named one.
        winner: Option<PlayerId>,
    },
    /// Back to the lobby after a finished round.
    ReturnedToLobby,
    /// Clock changed.
    ClockTick {
        /// Seconds left.
        remaining: f64,
    },
}

/// Round phase state machine.
#[derive(Clone, Debug, Default)]
pub struct RoundTracker {
    phase: Option<RoundState>,
    entered_lobby: bool,
    roster: Vec<PlayerRecord>,
    clock: Option<f64>,
    winner: Option<PlayerId>,
}

impl RoundTracker {
    /// Tracker with no phase yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last phase seen.
    #[inline]
    #[must_use]
    pub const fn phase(&self) -> Option<RoundState> {
        self.phase
    }

    /// True while a round is being played.
    #[inline]
    #[must_use]
    pub fn in_progress(&self) -> bool {
        self.phase == Some(RoundState::InProgress)
    }

    /// Winner of the last finished round.
    #[inline]
    #[must_use]
    pub const fn winner(&self) -> Option<&PlayerId> {
        self.winner.as_ref()
    }

    /// Last roster seen.
    #[inline]
    #[must_use]
    pub fn roster(&self) -> &[PlayerRecord] {
        &self.roster
    }

    /// Feeds one snapshot; returns the transitions it caused.
    pub fn observe(&mut self, snapshot: &Snapshot) -> Vec<RoundEvent> {
        let mut events = Vec::new();
        let round = snapshot.round();
        let previous = self.phase.replace(round);
        let roster_changed = self.roster != snapshot.players();
        if roster_changed {
            self.roster = snapshot.players().to_vec();
        }

        match round {
            RoundState::Waiting => {
                if !self.entered_lobby {
                    self.entered_lobby = true;
                    tracing::info!("entered lobby");
                    events.push(RoundEvent::EnteredLobby);
                } else if previous == Some(RoundState::GameOver) {
                    tracing::info!("returned to lobby");
                    events.push(RoundEvent::ReturnedToLobby);
                }
                if roster_changed || previous != Some(RoundState::Waiting) {
                    events.push(RoundEvent::RosterChanged(self.roster.clone()));
                }
            }
            RoundState::InProgress if previous != Some(RoundState::InProgress) => {
                tracing::info!(players = self.roster.len(), "round started");
                events.push(RoundEvent::RoundStarted);
            }
            RoundState::GameOver if previous != Some(RoundState::GameOver) => {
                self.winner = snapshot.winner().cloned();
                match &self.winner {
                    Some(winner) => tracing::info!(%winner, "round over"),
                    None => tracing::info!("round over without a winner"),
                }
                events.push(RoundEvent::RoundOver { winner: self.winner.clone() });
            }
            RoundState::InProgress | RoundState::GameOver => {}
        }

        if snapshot.time_remaining() != self.clock {
            self.clock = snapshot.time_remaining();
            if let Some(remaining) = self.clock {
                events.push(RoundEvent::ClockTick { remaining });
            }
        }
        events
    }

    /// Forgets the connection; the next lobby snapshot counts as the first.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
