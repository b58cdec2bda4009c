//! # Bomber Rendering
//!
//! The thin layer between the reconciliation engine and a drawing backend.
//!
//! ## Responsibilities
//!
//! - [`layout`]: one board layout, two screen spaces (top-left and
//!   bottom-left origin) that always agree
//! - [`wall_skin`]: wall orientation and dimming
//! - [`sink`]: the trait a backend implements, plus a recording sink
//! - [`scene`]: applies render ops to a sink and keeps sprites placed
//!   across viewport and board changes

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod layout;
pub mod scene;
pub mod sink;
pub mod wall_skin;

pub use layout::{BoardLayout, Point, Rect, Size, Space};
pub use scene::{SceneAdapter, SceneStats};
pub use sink::{Placement, RecordingSink, RenderSink, SinkCall, SpriteId, SpriteKind, WallTile};
pub use wall_skin::{style_for, Orientation, TileStyle, DESTRUCTIBLE_ALPHA};
