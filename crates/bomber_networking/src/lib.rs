//! # Bomber Networking
//!
//! Everything between the socket and the render sink.
//!
//! ## Architecture
//!
//! ```text
//!   TCP ──► transport (rx thread) ──► ChannelEvent ──► client (UI thread)
//!                                                        │
//!                          ┌─────────────────────────────┼──────────────┐
//!                          ▼                             ▼              ▼
//!                      reconcile ──► RenderOp        round ──► RoundEvent   timers
//!                          │
//!                      prediction (local player + working grid)
//! ```
//!
//! ## Performance Targets
//!
//! - Reconciliation: well under a millisecond for a 31x31 board with
//!   dozens of entities
//! - Zero locks on the reconciliation path
//! - One allocation per snapshot for the shared grid

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod error;
pub mod prediction;
pub mod reconcile;
pub mod round;
pub mod snapshot;
pub mod timers;
pub mod transport;

pub use client::{ClientFrame, GameClient, ReadyOutcome, SessionEvent};
pub use config::ClientConfig;
pub use error::{ConfigError, ConfigResult, NetError, NetResult};
pub use prediction::{LocalPrediction, PositionOutcome};
pub use reconcile::{
    PlayerView, ReconcileStats, ReconciliationCache, ReconciliationEngine, RenderHandle, RenderOp,
};
pub use round::{RoundEvent, RoundTracker};
pub use snapshot::{PlayerId, PlayerRecord, Snapshot, SnapshotBuilder};
pub use timers::{TimerId, TimerQueue};
pub use transport::{ChannelConfig, ChannelEvent, ChannelStats, LineChannel, Subscription};
