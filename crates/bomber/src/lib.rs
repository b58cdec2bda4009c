//! # Bomber Terminal Client
//!
//! Pieces the `bomber_client` binary is assembled from:
//!
//! ```text
//!   stdin thread ──► crossbeam ──► ┌────────────┐
//!                                  │ frame loop │ ◄── FramePacer (30 Hz)
//!   LineChannel ──► GameClient ──► │            │
//!                                  └─────┬──────┘
//!                                        ▼
//!                           SceneAdapter<AsciiSink> ──► stdout
//! ```
//!
//! - [`app`]: one session plus one scene, pumped a frame at a time
//! - [`cli`]: command-line flags layered over the TOML config
//! - [`input`]: keyboard lines to session commands
//! - [`pacer`]: fixed-rate frame pacing
//! - [`ascii`]: a render sink that draws the board as text

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod app;
pub mod ascii;
pub mod cli;
pub mod input;
pub mod pacer;

pub use app::{FrameOutput, TerminalApp};
pub use ascii::AsciiSink;
pub use cli::{CliArgs, CliError};
pub use input::{spawn_stdin_reader, Input};
pub use pacer::{FramePacer, FrameStats};

/// Frames per second of the client loop.
pub const FRAME_RATE: u32 = 30;
