//! defendum-link - Server link and arena map layer for the Defendum
//! competition robot
//!
//! The robot talks to the scoring server over an unreliable wireless
//! channel using a small fixed binary protocol. This crate owns that
//! link end to end:
//!
//! - [`protocol`]: frame encoding/decoding (5-byte header + typed payload)
//! - [`link`]: connection state machine, receive loop, sequence/ack
//!   tracking and the send operations the rest of the robot calls
//! - [`map`]: the discretized arena map reported to the server
//! - [`transport`]: channel abstraction (TCP plus a scripted mock)
//!
//! Everything here is best effort by design: a lost telemetry frame is
//! superseded by the next one, so loss is detected and logged but never
//! retransmitted, and no failure in this crate is fatal to the robot.
//!
//! ## Quick start
//!
//! ```no_run
//! use defendum_link::{config::AppConfig, core::Position, link};
//! use std::sync::atomic::AtomicBool;
//! use std::sync::Arc;
//!
//! # fn main() -> defendum_link::Result<()> {
//! let config = AppConfig::small_arena_defaults();
//! let running = Arc::new(AtomicBool::new(true));
//! let (link, _receiver) = link::init_link(&config.link, running)?;
//!
//! // Senders are fire-and-forget and never wait for an ack
//! if link.is_connected() {
//!     link.send_position(Position::new(250, 1300))?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod link;
pub mod map;
pub mod protocol;
pub mod transport;

// Re-export commonly used types
pub use crate::config::AppConfig;
pub use crate::core::{CellKind, GridCoord, Position};
pub use crate::error::{Error, Result};
pub use crate::link::{GameEvent, Link, LinkState, ReceiveLoop};
pub use crate::map::{ArenaMap, PointCluster};
