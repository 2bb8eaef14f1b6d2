//! Session lifecycle status.

use std::sync::Arc;

use crate::LiveError;
use crate::types::{GameEnd, GameStart};

/// Why a session stopped without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The game wrote its end record.
    GameEnd,
    /// A recognized top-level record showed up where only frame data was expected.
    UnexpectedEvent { tag: u8 },
    /// The consumer called [`LiveGame::stop`](crate::LiveGame::stop).
    Requested,
}

/// Observable state of a [`LiveGame`](crate::LiveGame) session.
#[derive(Debug, Clone, Default)]
pub enum SessionStatus {
    #[default]
    NotStarted,
    Running,
    Stopped(StopReason),
    Failed(Arc<LiveError>),
}

impl SessionStatus {
    /// Whether the background task has finished, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Stopped(_) | SessionStatus::Failed(_))
    }

    pub fn error(&self) -> Option<Arc<LiveError>> {
        match self {
            SessionStatus::Failed(err) => Some(Arc::clone(err)),
            _ => None,
        }
    }
}

/// Game-level metadata seen so far in the stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameInfo {
    pub start: Option<GameStart>,
    pub end: Option<GameEnd>,
}
