//! Core types for live replay data.
//!
//! - [`Event`] is the closed set of records the decoder produces
//! - [`Frame`] is the per-tick state the accumulator reconstructs from frame events
//! - [`SessionStatus`] and [`StopReason`] describe where a live session is in its lifecycle
//! - [`GameInfo`] holds the game start and end records once they have been seen
//!
//! ## Usage Example
//!
//! ```rust
//! use slippi_live::types::{Frame, PlayerData, PortState, PreFrame};
//!
//! let mut frame = Frame::new(0);
//! frame.ports[1] = Some(PortState {
//!     leader: PlayerData { pre: Some(PreFrame::default()), post: None },
//!     follower: None,
//! });
//!
//! let (port, state) = frame.occupied_ports().next().unwrap();
//! assert_eq!(port, 1);
//! assert!(!state.leader.is_complete());
//! ```

mod event;
mod frame;
mod status;

pub use event::{
    Event, FrameData, FrameEvent, FrameId, GameEnd, GameEndMethod, GameStart, Position,
    PostFrame, PreFrame,
};
pub use frame::{Frame, NUM_PORTS, PlayerData, PortState};
pub use status::{GameInfo, SessionStatus, StopReason};
