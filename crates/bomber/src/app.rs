//! # Terminal App
//!
//! One session plus one scene, driven a frame at a time by the binary.
//!
//! ```text
//!   Input ──► handle_input ──► GameClient (predict + send)
//!                                  │ local move op
//!                                  ▼
//!   frame(now) ──► poll ──► ops ──► SceneAdapter<AsciiSink> ──► board text
//!                   └────► round / session events ──► notices
//! ```

use std::time::Instant;

use bomber_networking::{GameClient, ReadyOutcome, RoundEvent, SessionEvent};
use bomber_rendering::{SceneAdapter, Size};

use crate::ascii::AsciiSink;
use crate::input::Input;

/// Viewport handed to the layout. The ASCII sink only reads cells, so any
/// size that fits one unit per cell will do.
const VIEWPORT: Size = Size::new(1024.0, 1024.0);

/// What one frame produced for the terminal.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FrameOutput {
    /// Board picture, if it changed.
    pub board: Option<String>,
    /// One-line messages, in order.
    pub notices: Vec<String>,
}

/// The terminal client's state.
#[derive(Debug)]
pub struct TerminalApp {
    client: GameClient,
    scene: SceneAdapter<AsciiSink>,
    auto_ready: bool,
    running: bool,
    quitting: bool,
    notices: Vec<String>,
}

impl TerminalApp {
    /// Wraps a session. With `auto_ready`, `ready` is sent every time the
    /// lobby is entered.
    #[must_use]
    pub fn new(client: GameClient, auto_ready: bool) -> Self {
        Self {
            client,
            scene: SceneAdapter::new(AsciiSink::new(), VIEWPORT),
            auto_ready,
            running: true,
            quitting: false,
            notices: Vec::new(),
        }
    }

    /// The session.
    #[inline]
    #[must_use]
    pub const fn client(&self) -> &GameClient {
        &self.client
    }

    /// The session, mutably (for connecting).
    #[inline]
    pub fn client_mut(&mut self) -> &mut GameClient {
        &mut self.client
    }

    /// The scene.
    #[inline]
    #[must_use]
    pub const fn scene(&self) -> &SceneAdapter<AsciiSink> {
        &self.scene
    }

    /// False once the connection has closed, whether the user quit or the
    /// server went away.
    #[inline]
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Acts on one user intent.
    pub fn handle_input(&mut self, input: Input, now: Instant) {
        match input {
            Input::Move(direction) => {
                if let Some(op) = self.client.move_player(direction) {
                    self.scene.apply(&op);
                }
            }
            Input::PlaceBomb => self.client.place_bomb(now),
            Input::Ready => self.send_ready(),
            Input::Quit => self.shutdown(),
        }
    }

    /// Pumps the session once.
    pub fn frame(&mut self, now: Instant) -> FrameOutput {
        let frame = self.client.poll(now);
        self.scene.apply_all(&frame.ops);

        for event in frame.session {
            match event {
                SessionEvent::Identified(id) => self.notices.push(format!("connected as {id}")),
                SessionEvent::Disconnected { cause } => {
                    self.running = false;
                    self.notices.push(match cause {
                        Some(cause) => format!("connection lost: {cause}"),
                        None => "disconnected".to_owned(),
                    });
                }
            }
        }
        for event in frame.rounds {
            self.on_round(event);
        }

        FrameOutput {
            board: self.scene.sink_mut().take_frame(),
            notices: std::mem::take(&mut self.notices),
        }
    }

    /// Closes the connection. The app keeps running until the next
    /// [`TerminalApp::frame`] reports the close.
    pub fn shutdown(&mut self) {
        if self.running && !self.quitting {
            self.quitting = true;
            self.client.disconnect();
        }
    }

    fn on_round(&mut self, event: RoundEvent) {
        match event {
            RoundEvent::EnteredLobby | RoundEvent::ReturnedToLobby => {
                self.notices.push("in lobby".to_owned());
                if self.auto_ready {
                    self.send_ready();
                }
            }
            RoundEvent::RosterChanged(roster) => {
                let names: Vec<String> = roster
                    .iter()
                    .map(|p| if p.ready { format!("{}*", p.name) } else { p.name.clone() })
                    .collect();
                self.notices.push(format!("lobby: {}", names.join(", ")));
            }
            RoundEvent::RoundStarted => self.notices.push("round started".to_owned()),
            RoundEvent::RoundOver { winner } => self.notices.push(match winner {
                Some(id) => format!("round over, winner {id}"),
                None => "round over, no winner".to_owned(),
            }),
            RoundEvent::ClockTick { remaining } => {
                tracing::trace!(remaining, "clock");
            }
        }
    }

    fn send_ready(&mut self) {
        match self.client.ready() {
            ReadyOutcome::Sent => self.notices.push("ready".to_owned()),
            ReadyOutcome::AlreadyInProgress => {
                self.notices.push("round already running".to_owned());
            }
        }
    }
}
