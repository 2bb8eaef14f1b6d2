//! Live tailing of Slippi replays while the game is still writing them.
//!
//! A replay grows on disk for the whole match. `slippi-live` follows the file as it grows,
//! decodes each event record once it is fully written, and folds frame events into complete
//! [`Frame`]s that a consumer drains at its own pace.
//!
//! # Features
//!
//! - **Incremental**: only whole records are consumed; partial writes are picked up on the
//!   next re-read
//! - **Non-blocking drain**: [`LiveGame::collect`] never waits on the tailer
//! - **Pluggable decoding**: any [`EventDecoder`] can replace the built-in [`SlippiDecoder`]
//! - **Observable**: session status and game metadata are published over watch channels
//!
//! ## Example
//!
//! ```rust,no_run
//! use slippi_live::LiveGame;
//! use futures::StreamExt;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> slippi_live::Result<()> {
//!     let mut game = LiveGame::new();
//!     let _ = game.start("Game_20261016T203512.slp");
//!
//!     let mut batches = game.drain_every(Duration::from_millis(16));
//!     while let Some(frames) = batches.next().await {
//!         for frame in frames {
//!             println!("frame {}: {} ports", frame.index, frame.occupied_ports().count());
//!         }
//!     }
//!
//!     if let Some(err) = game.last_error() {
//!         eprintln!("session failed: {err}");
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Replay format and decoding
pub mod config;
pub mod slp;
pub mod source;

// Live session machinery
pub mod accumulator;
pub mod game;
pub mod queue;
pub mod stream;
pub mod tailer;

// Core exports
pub use error::*;
pub use types::*;

pub use accumulator::{Applied, FrameAccumulator};
pub use config::LiveConfig;
pub use game::{LiveGame, StartOutcome};
pub use queue::FrameQueue;
pub use slp::{DecodeError, EventDecoder, PayloadSizeTable, SlippiDecoder};
pub use source::{FileSource, SnapshotSource};
pub use stream::DrainStream;
pub use tailer::{LiveTailer, StreamCursor};
