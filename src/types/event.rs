//! Decoded replay events.

use serde::{Deserialize, Serialize};

/// A single decoded record from the replay stream.
///
/// The set is closed: every record the decoder reports is one of these, and the frame
/// accumulator matches on it exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// Per-port, per-frame character state.
    Frame(FrameEvent),
    /// Session metadata written once before the first frame.
    Start(GameStart),
    /// Session termination.
    End(GameEnd),
    /// A recognized top-level record that has no place in a live session.
    Other(u8),
}

/// Which port and frame a [`FrameEvent`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameId {
    pub frame: i32,
    pub port: u8,
    pub is_follower: bool,
}

/// Frame-scoped record carrying one sub-phase of a character's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameEvent {
    pub id: FrameId,
    pub data: FrameData,
}

/// Payload sub-kind of a [`FrameEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FrameData {
    Pre(PreFrame),
    Post(PostFrame),
    /// Frame-scoped payload a decoder could frame but not classify, keyed by its tag.
    Unrecognized(u8),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

/// Character state before the simulation step (inputs included).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreFrame {
    pub random_seed: u32,
    pub state: u16,
    pub position: Position,
    pub direction: f32,
    pub joystick: Position,
    pub cstick: Position,
    pub trigger: f32,
    pub buttons: u32,
}

/// Character state after the simulation step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostFrame {
    pub character: u8,
    pub state: u16,
    pub position: Position,
    pub direction: f32,
    pub damage: f32,
    pub shield: f32,
    pub last_attack_landed: u8,
    pub combo_count: u8,
    pub last_hit_by: u8,
    pub stocks: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStart {
    /// Slippi version as (major, minor, build).
    pub slippi_version: (u8, u8, u8),
    pub is_teams: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEnd {
    pub method: GameEndMethod,
    /// Port that quit out with L+R+A+Start, when the game recorded one.
    pub lras_initiator: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEndMethod {
    Unresolved,
    Time,
    Game,
    Resolved,
    NoContest,
    Unknown(u8),
}

impl From<u8> for GameEndMethod {
    fn from(value: u8) -> Self {
        match value {
            0 => GameEndMethod::Unresolved,
            1 => GameEndMethod::Time,
            2 => GameEndMethod::Game,
            3 => GameEndMethod::Resolved,
            7 => GameEndMethod::NoContest,
            other => GameEndMethod::Unknown(other),
        }
    }
}
