//! # Transport Channel
//!
//! One persistent TCP connection carrying JSON lines.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                       LINE CHANNEL                         │
//! ├────────────────────────────────────────────────────────────┤
//! │   game thread                    bomber-net-rx thread      │
//! │  ┌──────────────┐               ┌──────────────────────┐   │
//! │  │ send()       │── TcpStream ─►│                      │   │
//! │  │ disconnect() │               │ LineReader           │   │
//! │  └──────────────┘               │   → ServerMessage    │   │
//! │         ▲                       │   → ChannelEvent     │   │
//! │         │  crossbeam channel    └──────────┬───────────┘   │
//! │  ┌──────┴───────┐                          │               │
//! │  │ Subscription │◄──── ObserverHub ◄───────┘               │
//! │  └──────────────┘                                          │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Frames are decoded on the receive thread and handed over as values; the
//! game thread never shares mutable state with it.
//!
//! Failures never reach the caller of [`LineChannel::send`]. They close the
//! connection and publish [`ChannelEvent::Disconnected`] with the cause.
//! [`LineChannel::disconnect`] publishes it with no cause. There is no
//! automatic reconnect.

mod codec;
mod observers;

pub use codec::{encode_line, excerpt, LineReader};
pub use observers::{ChannelEvent, ObserverHub, Subscription};

use std::io::{BufReader, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bomber_shared::{ClientCommand, ServerMessage};
use parking_lot::Mutex;

use crate::config::ClientConfig;
use crate::error::{NetError, NetResult};
use crate::snapshot::{PlayerId, Snapshot};

/// Connection parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelConfig {
    /// `host:port`.
    pub addr: String,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Longest inbound line accepted.
    pub max_frame_bytes: usize,
}

impl From<&ClientConfig> for ChannelConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            addr: config.server_addr(),
            connect_timeout: config.connect_timeout(),
            max_frame_bytes: config.max_frame_bytes,
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

/// Transmission counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChannelStats {
    /// Commands written.
    pub commands_sent: u64,
    /// Inbound frames decoded and published.
    pub frames_received: u64,
    /// Inbound frames dropped as undecodable.
    pub frames_dropped: u64,
}

#[derive(Debug)]
struct Connection {
    stream: TcpStream,
    generation: u64,
}

#[derive(Debug, Default)]
struct Slot {
    connection: Option<Connection>,
    generation: u64,
}

#[derive(Debug, Default)]
struct Shared {
    slot: Mutex<Slot>,
    hub: ObserverHub,
    stats: Mutex<ChannelStats>,
}

impl Shared {
    /// Publishes an inbound `event` only while connection `generation` is
    /// the open one, and counts it as received.
    ///
    /// The slot stays locked across the publish, so nothing from a closed
    /// connection can follow its [`ChannelEvent::Disconnected`].
    fn publish_if_current(&self, generation: u64, event: &ChannelEvent) -> bool {
        let slot = self.slot.lock();
        let current = slot.connection.as_ref().is_some_and(|c| c.generation == generation);
        if current {
            self.stats.lock().frames_received += 1;
            self.hub.publish(event);
        }
        current
    }

    /// Closes connection `generation` if it is still the current one and
    /// reports why. A stale generation means the close was intentional and
    /// has already been reported.
    fn fail(&self, generation: u64, cause: NetError) {
        let closed = {
            let mut slot = self.slot.lock();
            let current = slot.connection.as_ref().is_some_and(|c| c.generation == generation);
            if current {
                slot.connection.take()
            } else {
                None
            }
        };
        if let Some(conn) = closed {
            let _ = conn.stream.shutdown(Shutdown::Both);
            tracing::warn!(error = %cause, "connection lost");
            self.hub.publish(&ChannelEvent::Disconnected { cause: Some(Arc::new(cause)) });
        }
    }
}

/// Persistent bidirectional message channel to the game server.
///
/// Constructed explicitly and shared by reference; there is no global
/// instance.
#[derive(Debug)]
pub struct LineChannel {
    config: ChannelConfig,
    shared: Arc<Shared>,
}

impl LineChannel {
    /// Creates a disconnected channel.
    #[must_use]
    pub fn new(config: ChannelConfig) -> Self {
        Self { config, shared: Arc::new(Shared::default()) }
    }

    /// Connection parameters.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Registers an observer for inbound events.
    pub fn subscribe(&self) -> Subscription {
        self.shared.hub.subscribe()
    }

    /// True while a connection is open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.shared.slot.lock().connection.is_some()
    }

    /// Transmission counters.
    #[must_use]
    pub fn stats(&self) -> ChannelStats {
        *self.shared.stats.lock()
    }

    /// Opens the connection and starts the receive loop.
    ///
    /// Returns true when a new connection was opened, false if one was
    /// already open.
    pub fn connect(&self) -> NetResult<bool> {
        let mut slot = self.shared.slot.lock();
        if slot.connection.is_some() {
            tracing::debug!(addr = %self.config.addr, "connect ignored; already connected");
            return Ok(false);
        }

        let stream = self.open()?;
        stream.set_nodelay(true)?;
        // Writes happen under the slot lock; a stalled peer must not hold it forever.
        stream.set_write_timeout(Some(self.config.connect_timeout))?;
        let reader = stream.try_clone()?;
        slot.generation += 1;
        let generation = slot.generation;

        let shared = Arc::clone(&self.shared);
        let limit = self.config.max_frame_bytes;
        thread::Builder::new()
            .name("bomber-net-rx".into())
            .spawn(move || receive_loop(&shared, reader, generation, limit))?;

        slot.connection = Some(Connection { stream, generation });
        tracing::info!(addr = %self.config.addr, generation, "connected");
        Ok(true)
    }

    fn open(&self) -> NetResult<TcpStream> {
        let addrs: Vec<SocketAddr> = self.config.addr.to_socket_addrs()?.collect();
        let mut last_err = None;
        for addr in &addrs {
            match TcpStream::connect_timeout(addr, self.config.connect_timeout) {
                Ok(stream) => return Ok(stream),
                Err(err) => {
                    tracing::debug!(%addr, error = %err, "connect attempt failed");
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.map_or_else(|| NetError::Unresolvable(self.config.addr.clone()), NetError::Io))
    }

    /// Sends one command. Fire and forget.
    ///
    /// Encode failures are logged and the command is dropped. Write failures,
    /// including a write stalled past the connect timeout, close the
    /// connection and publish [`ChannelEvent::Disconnected`].
    pub fn send(&self, command: &ClientCommand) {
        let line = match encode_line(command) {
            Ok(line) => line,
            Err(err) => {
                tracing::warn!(kind = command.kind(), error = %err, "command not sent");
                return;
            }
        };

        let failed = {
            let mut slot = self.shared.slot.lock();
            let Some(conn) = slot.connection.as_mut() else {
                tracing::warn!(kind = command.kind(), "send while disconnected; dropped");
                return;
            };
            match conn.stream.write_all(line.as_bytes()) {
                Ok(()) => None,
                Err(err) => Some((conn.generation, err)),
            }
        };

        match failed {
            None => {
                self.shared.stats.lock().commands_sent += 1;
                tracing::trace!(kind = command.kind(), "sent");
            }
            Some((generation, err)) => {
                tracing::warn!(kind = command.kind(), error = %err, "send failed");
                self.shared.fail(generation, NetError::Io(err));
            }
        }
    }

    /// Closes the connection and publishes a cause-less
    /// [`ChannelEvent::Disconnected`], whether or not one was open.
    pub fn disconnect(&self) {
        let closed = self.shared.slot.lock().connection.take();
        if let Some(conn) = closed {
            if let Err(err) = conn.stream.shutdown(Shutdown::Both) {
                tracing::debug!(error = %err, "shutdown on close failed");
            }
            tracing::info!(addr = %self.config.addr, "disconnected");
        }
        self.shared.hub.publish(&ChannelEvent::Disconnected { cause: None });
    }
}

impl Drop for LineChannel {
    fn drop(&mut self) {
        if let Some(conn) = self.shared.slot.lock().connection.take() {
            let _ = conn.stream.shutdown(Shutdown::Both);
        }
    }
}

fn receive_loop(shared: &Shared, stream: TcpStream, generation: u64, limit: usize) {
    let mut reader = LineReader::new(BufReader::new(stream), limit);
    let cause = loop {
        let frame = match reader.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => break NetError::ClosedByPeer,
            Err(err) => break NetError::Io(err),
        };
        let line = match frame {
            Ok(line) => line,
            Err(err) => {
                tracing::warn!(error = %err, "dropped inbound frame");
                shared.stats.lock().frames_dropped += 1;
                continue;
            }
        };
        let event = match ServerMessage::decode(&line) {
            Ok(ServerMessage::AssignId(id)) => {
                tracing::info!(%id, "player id assigned");
                ChannelEvent::AssignedId(PlayerId::new(id))
            }
            Ok(ServerMessage::GameState(wire)) => {
                ChannelEvent::Snapshot(Arc::new(Snapshot::from_wire(wire)))
            }
            Err(err) => {
                tracing::warn!(error = %err, frame = excerpt(&line), "dropped inbound frame");
                shared.stats.lock().frames_dropped += 1;
                continue;
            }
        };
        if !shared.publish_if_current(generation, &event) {
            tracing::debug!(generation, "connection closed; frame discarded");
            return;
        }
    };
    shared.fail(generation, cause);
    tracing::debug!(generation, "receive loop finished");
}
