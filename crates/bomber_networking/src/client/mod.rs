//! # Game Client
//!
//! The session object the UI-affine thread owns: it drains the channel,
//! drives the engine and round tracker, and turns input into commands.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        GAME CLIENT                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐        │
//! │  │ Reconcile    │  │ RoundTracker │  │ TimerQueue   │        │
//! │  │ Engine       │  │ (lobby)      │  │ (fuses)      │        │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘        │
//! │         └─────────────────┼─────────────────┘                │
//! │                    ┌──────▼───────┐                          │
//! │                    │ ClientFrame  │ ops + events per poll    │
//! │                    └──────────────┘                          │
//! │  Subscription ◄──── LineChannel (shared, injected) ────► TCP │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here locks. Call every method from the same thread.

use std::sync::Arc;
use std::time::Instant;

use bomber_shared::{ClientCommand, ClientRole, Direction, GridPos};

use crate::config::ClientConfig;
use crate::error::{NetError, NetResult};
use crate::reconcile::{ReconcileStats, ReconciliationEngine, RenderOp};
use crate::round::{RoundEvent, RoundTracker};
use crate::snapshot::PlayerId;
use crate::timers::TimerQueue;
use crate::transport::{ChannelEvent, LineChannel, Subscription};

/// Connection-level happenings.
#[derive(Clone, Debug)]
pub enum SessionEvent {
    /// The server assigned our player id.
    Identified(PlayerId),
    /// The channel closed. `None` means on purpose.
    Disconnected {
        /// Underlying failure, if any.
        cause: Option<Arc<NetError>>,
    },
}

/// Everything one [`GameClient::poll`] produced, in arrival order per list.
#[derive(Clone, Debug, Default)]
pub struct ClientFrame {
    /// Render operations for the sink.
    pub ops: Vec<RenderOp>,
    /// Round transitions.
    pub rounds: Vec<RoundEvent>,
    /// Connection events.
    pub session: Vec<SessionEvent>,
}

impl ClientFrame {
    /// True if nothing happened.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty() && self.rounds.is_empty() && self.session.is_empty()
    }
}

/// What [`GameClient::ready`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadyOutcome {
    /// `ready` was sent.
    Sent,
    /// A round is already running; nothing was sent. Go straight to the
    /// game view.
    AlreadyInProgress,
}

#[derive(Clone, Copy, Debug)]
struct PendingBlast {
    center: GridPos,
}

/// One client session.
#[derive(Debug)]
pub struct GameClient {
    config: ClientConfig,
    channel: Arc<LineChannel>,
    events: Subscription,
    engine: ReconciliationEngine,
    rounds: RoundTracker,
    timers: TimerQueue<PendingBlast>,
}

impl GameClient {
    /// Creates a session on an existing channel. Subscribes immediately.
    #[must_use]
    pub fn new(config: ClientConfig, channel: Arc<LineChannel>) -> Self {
        let events = channel.subscribe();
        Self {
            config,
            channel,
            events,
            engine: ReconciliationEngine::new(),
            rounds: RoundTracker::new(),
            timers: TimerQueue::new(),
        }
    }

    /// Session config.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The channel this session talks through.
    #[inline]
    #[must_use]
    pub const fn channel(&self) -> &Arc<LineChannel> {
        &self.channel
    }

    /// Reconciliation engine, for inspection.
    #[inline]
    #[must_use]
    pub const fn engine(&self) -> &ReconciliationEngine {
        &self.engine
    }

    /// Round tracker, for inspection.
    #[inline]
    #[must_use]
    pub const fn rounds(&self) -> &RoundTracker {
        &self.rounds
    }

    /// Our player id, once assigned.
    #[inline]
    #[must_use]
    pub const fn player_id(&self) -> Option<&PlayerId> {
        self.engine.local_id()
    }

    /// Engine counters.
    #[must_use]
    pub const fn stats(&self) -> ReconcileStats {
        self.engine.stats()
    }

    /// Connects the channel and sends `join`. Does nothing if the channel
    /// was already connected.
    pub fn connect(&mut self) -> NetResult<()> {
        if self.channel.connect()? {
            self.join();
        }
        Ok(())
    }

    /// Sends `join` with the configured role; the name goes only with
    /// role=player.
    pub fn join(&self) {
        let command = ClientCommand::join(self.config.role, self.config.player_name.clone());
        tracing::info!(role = ?self.config.role, "joining");
        self.channel.send(&command);
    }

    /// Declares ready, unless a round is already being played.
    pub fn ready(&self) -> ReadyOutcome {
        if self.rounds.in_progress() {
            tracing::debug!("ready skipped; round in progress");
            return ReadyOutcome::AlreadyInProgress;
        }
        self.channel.send(&ClientCommand::Ready);
        ReadyOutcome::Sent
    }

    /// Moves one step: predicted locally first, then sent.
    ///
    /// Returns the local move op if the step was walkable in the working
    /// grid. The command is sent either way; the server decides.
    pub fn move_player(&mut self, direction: Direction) -> Option<RenderOp> {
        if self.config.role == ClientRole::Spectator {
            return None;
        }
        let op = self.engine.predict_step(direction);
        self.channel.send(&ClientCommand::step(direction));
        op
    }

    /// Requests a bomb at the current cell and arms the local fuse for the
    /// speculative blast.
    pub fn place_bomb(&mut self, now: Instant) {
        if self.config.role == ClientRole::Spectator {
            return;
        }
        self.channel.send(&ClientCommand::PlaceBomb);
        if let (Some(fuse), Some(center)) =
            (self.config.speculative_fuse(), self.engine.local().position())
        {
            self.timers.schedule(now, fuse, PendingBlast { center });
        }
    }

    /// Closes the channel and cancels pending timers. The resulting
    /// [`SessionEvent::Disconnected`] arrives on the next poll.
    pub fn disconnect(&mut self) {
        self.cancel_timers();
        self.channel.disconnect();
    }

    /// Drains the channel and fires due timers.
    pub fn poll(&mut self, now: Instant) -> ClientFrame {
        let mut frame = ClientFrame::default();
        while let Some(event) = self.events.try_recv() {
            match event {
                ChannelEvent::AssignedId(id) => {
                    self.engine.set_local_id(id.clone());
                    frame.session.push(SessionEvent::Identified(id));
                }
                ChannelEvent::Snapshot(snapshot) => {
                    frame.rounds.extend(self.rounds.observe(&snapshot));
                    frame.ops.extend(self.engine.apply(snapshot));
                }
                ChannelEvent::Disconnected { cause } => {
                    self.cancel_timers();
                    frame.ops.extend(self.engine.reset());
                    self.rounds.reset();
                    frame.session.push(SessionEvent::Disconnected { cause });
                }
            }
        }

        for blast in self.timers.pop_due(now) {
            frame.ops.extend(self.engine.detonate(blast.center, self.config.blast));
        }
        frame
    }

    fn cancel_timers(&mut self) {
        let cancelled = self.timers.clear();
        if cancelled > 0 {
            tracing::debug!(cancelled, "pending timers cancelled");
        }
    }
}

impl Drop for GameClient {
    fn drop(&mut self) {
        self.cancel_timers();
    }
}
