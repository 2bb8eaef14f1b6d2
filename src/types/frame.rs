//! Reconstructed per-frame game state.

use serde::{Deserialize, Serialize};

use super::{PostFrame, PreFrame};

/// Number of controller ports a frame tracks.
pub const NUM_PORTS: usize = 4;

/// One simulation tick's worth of per-port state.
///
/// A drained frame is the best knowledge at the time it was closed: ports can be missing
/// and a port's player data may hold only one of its two sub-phases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub index: i32,
    pub ports: [Option<PortState>; NUM_PORTS],
}

impl Frame {
    pub fn new(index: i32) -> Self {
        Self { index, ports: Default::default() }
    }

    /// State for `port`, if any event referenced it this frame.
    pub fn port(&self, port: usize) -> Option<&PortState> {
        self.ports.get(port).and_then(Option::as_ref)
    }

    /// Iterate occupied ports as `(port, state)`.
    pub fn occupied_ports(&self) -> impl Iterator<Item = (usize, &PortState)> {
        self.ports.iter().enumerate().filter_map(|(i, p)| p.as_ref().map(|p| (i, p)))
    }

    pub(crate) fn port_mut(&mut self, port: usize) -> &mut PortState {
        self.ports[port].get_or_insert_with(PortState::default)
    }
}

/// Leader and optional follower occupying a single port.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortState {
    pub leader: PlayerData,
    /// Only present for secondary characters such as Nana.
    pub follower: Option<PlayerData>,
}

impl PortState {
    pub(crate) fn player_mut(&mut self, is_follower: bool) -> &mut PlayerData {
        if is_follower {
            self.follower.get_or_insert_with(PlayerData::default)
        } else {
            &mut self.leader
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerData {
    pub pre: Option<PreFrame>,
    pub post: Option<PostFrame>,
}

impl PlayerData {
    pub fn is_complete(&self) -> bool {
        self.pre.is_some() && self.post.is_some()
    }
}
