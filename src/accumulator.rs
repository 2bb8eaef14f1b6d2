//! Folding decoded events into frames

use tracing::{info, trace, warn};

use crate::types::{
    Event, Frame, FrameData, FrameEvent, GameEnd, GameStart, NUM_PORTS, StopReason,
};
use crate::{LiveError, Result};

/// What a single [`FrameAccumulator::apply`] call produced.
#[derive(Debug, Default)]
pub struct Applied {
    /// Frame closed by this event, ready to be queued.
    pub completed: Option<Frame>,
    /// Set when the event ends the session.
    pub stop: Option<StopReason>,
}

/// Builds frames out of the event stream
///
/// Only one frame is in progress at a time. It is closed as soon as a frame event for a
/// different index arrives, or when the session ends. The stream carries no explicit
/// frame-complete marker, so a closed frame may still lack data for some ports, and an index
/// the game re-sends (rollback) is delivered again as a new frame.
#[derive(Debug, Default)]
pub struct FrameAccumulator {
    current: Option<Frame>,
    start: Option<GameStart>,
    end: Option<GameEnd>,
    frames_closed: u64,
}

impl FrameAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event.
    ///
    /// Validation happens before any state changes, so an error leaves the accumulator
    /// exactly as it was before the offending event.
    pub fn apply(&mut self, event: Event) -> Result<Applied> {
        match event {
            Event::Frame(frame_event) => self.apply_frame_event(frame_event),
            Event::Start(start) => {
                info!(
                    "Game start: Slippi {}.{}.{}, teams={}",
                    start.slippi_version.0, start.slippi_version.1, start.slippi_version.2,
                    start.is_teams
                );
                self.start = Some(start);
                Ok(Applied::default())
            }
            Event::End(end) => {
                info!("Game end: {:?}", end.method);
                self.end = Some(end);
                Ok(Applied { completed: self.flush(), stop: Some(StopReason::GameEnd) })
            }
            Event::Other(tag) => {
                warn!("Unexpected top-level event {:#04x}, ending session", tag);
                Ok(Applied {
                    completed: self.flush(),
                    stop: Some(StopReason::UnexpectedEvent { tag }),
                })
            }
        }
    }

    fn apply_frame_event(&mut self, event: FrameEvent) -> Result<Applied> {
        let FrameEvent { id, data } = event;

        if id.port as usize >= NUM_PORTS {
            return Err(LiveError::InvalidPort { port: id.port, frame: id.frame });
        }
        let (pre, post) = match data {
            FrameData::Pre(pre) => (Some(pre), None),
            FrameData::Post(post) => (None, Some(post)),
            FrameData::Unrecognized(tag) => {
                return Err(LiveError::UnknownPayloadVariant { tag, frame: id.frame });
            }
        };

        let completed = match &self.current {
            Some(frame) if frame.index != id.frame => self.flush(),
            _ => None,
        };

        trace!("Frame {} port {} follower={}", id.frame, id.port, id.is_follower);
        let frame = self.current.get_or_insert_with(|| Frame::new(id.frame));
        let player = frame.port_mut(id.port as usize).player_mut(id.is_follower);
        if pre.is_some() {
            player.pre = pre;
        }
        if post.is_some() {
            player.post = post;
        }

        Ok(Applied { completed, stop: None })
    }

    /// Close the in-progress frame, if any.
    pub fn flush(&mut self) -> Option<Frame> {
        let frame = self.current.take()?;
        self.frames_closed += 1;
        Some(frame)
    }

    /// Whether the game start record has been seen.
    pub fn has_started(&self) -> bool {
        self.start.is_some()
    }

    pub fn game_start(&self) -> Option<&GameStart> {
        self.start.as_ref()
    }

    pub fn game_end(&self) -> Option<&GameEnd> {
        self.end.as_ref()
    }

    pub fn frames_closed(&self) -> u64 {
        self.frames_closed
    }
}
