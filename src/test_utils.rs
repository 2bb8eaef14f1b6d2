//! Test utilities for building replay streams and feeding them to the tailer
//!
//! Replays written by the game are large and tied to specific Slippi versions, so tests and
//! benchmarks build byte-exact streams in memory instead of shipping fixtures.

#![cfg(any(test, feature = "benchmark"))]

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::slp::format::{RAW_PREFIX, tags};
use crate::source::SnapshotSource;

/// Payload sizes Slippi 3.x declares for the events the default decoder understands.
pub const SLIPPI_PAYLOAD_SIZES: &[(u8, u16)] = &[
    (tags::GAME_START, 760),
    (tags::PRE_FRAME, 63),
    (tags::POST_FRAME, 80),
    (tags::GAME_END, 2),
    (tags::FRAME_START, 12),
    (tags::ITEM, 42),
    (tags::FRAME_BOOKEND, 8),
];

/// Builder for replay byte streams
///
/// Starts with the raw preamble and the Event Payloads record; records are appended with
/// [`record`](SlpBuilder::record) and raw bytes with [`raw`](SlpBuilder::raw).
#[derive(Debug, Clone)]
pub struct SlpBuilder {
    bytes: Vec<u8>,
}

impl SlpBuilder {
    pub fn new(sizes: &[(u8, u16)]) -> Self {
        let mut bytes = RAW_PREFIX.to_vec();
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.push(tags::EVENT_PAYLOADS);
        bytes.push((sizes.len() * 3 + 1) as u8);
        for &(tag, size) in sizes {
            bytes.push(tag);
            bytes.extend_from_slice(&size.to_be_bytes());
        }
        Self { bytes }
    }

    /// Builder declaring [`SLIPPI_PAYLOAD_SIZES`].
    pub fn slippi() -> Self {
        Self::new(SLIPPI_PAYLOAD_SIZES)
    }

    /// Append a record exactly as given.
    pub fn record(&mut self, tag: u8, payload: &[u8]) -> &mut Self {
        self.bytes.push(tag);
        self.bytes.extend_from_slice(payload);
        self
    }

    /// Append a Slippi record padded to its declared size.
    pub fn slippi_record(&mut self, tag: u8, payload: &[u8]) -> &mut Self {
        let size = SLIPPI_PAYLOAD_SIZES
            .iter()
            .find(|&&(t, _)| t == tag)
            .map(|&(_, size)| size as usize)
            .unwrap_or(payload.len());
        let mut padded = payload.to_vec();
        padded.resize(size.max(payload.len()), 0);
        self.record(tag, &padded)
    }

    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Game start payload for Slippi 3.12.0, not teams.
pub fn game_start_payload() -> Vec<u8> {
    let mut payload = vec![0u8; 16];
    payload[..4].copy_from_slice(&[3, 12, 0, 0]);
    payload
}

/// Pre-frame payload whose position encodes `(frame, port)` and whose state is 14 (Wait).
pub fn pre_frame_payload(frame: i32, port: u8, is_follower: bool) -> Vec<u8> {
    let mut payload = vec![0u8; 63];
    payload[0..4].copy_from_slice(&frame.to_be_bytes());
    payload[4] = port;
    payload[5] = is_follower as u8;
    payload[6..10].copy_from_slice(&(frame as u32).to_be_bytes());
    payload[10..12].copy_from_slice(&14u16.to_be_bytes());
    payload[12..16].copy_from_slice(&(frame as f32).to_be_bytes());
    payload[16..20].copy_from_slice(&(port as f32).to_be_bytes());
    payload[20..24].copy_from_slice(&1f32.to_be_bytes());
    payload
}

/// Post-frame payload with 4 stocks and damage equal to the frame index.
pub fn post_frame_payload(frame: i32, port: u8, is_follower: bool) -> Vec<u8> {
    let mut payload = vec![0u8; 80];
    payload[0..4].copy_from_slice(&frame.to_be_bytes());
    payload[4] = port;
    payload[5] = is_follower as u8;
    payload[6] = 0x02; // Fox
    payload[7..9].copy_from_slice(&14u16.to_be_bytes());
    payload[21..25].copy_from_slice(&(frame as f32).to_be_bytes());
    payload[25..29].copy_from_slice(&60f32.to_be_bytes());
    payload[32] = 4;
    payload
}

/// Game end payload; `None` writes the "no initiator" marker.
pub fn game_end_payload(method: u8, lras_initiator: Option<u8>) -> Vec<u8> {
    vec![method, lras_initiator.unwrap_or(0xff)]
}

/// Complete Slippi stream: start, `frames` frames of pre/post for `ports`, then game end.
pub fn slippi_game(frames: i32, ports: &[u8]) -> Vec<u8> {
    let mut builder = SlpBuilder::slippi();
    builder.slippi_record(tags::GAME_START, &game_start_payload());
    for frame in -123..(-123 + frames) {
        builder.slippi_record(tags::FRAME_START, &frame.to_be_bytes());
        for &port in ports {
            builder.slippi_record(tags::PRE_FRAME, &pre_frame_payload(frame, port, false));
        }
        for &port in ports {
            builder.slippi_record(tags::POST_FRAME, &post_frame_payload(frame, port, false));
        }
        builder.slippi_record(tags::FRAME_BOOKEND, &frame.to_be_bytes());
    }
    builder.slippi_record(tags::GAME_END, &game_end_payload(2, None));
    builder.into_bytes()
}

#[derive(Debug, Default)]
struct MemoryState {
    data: Vec<u8>,
    failures: Vec<ErrorKind>,
    reads: u64,
}

/// In-memory snapshot source standing in for a file another process appends to
///
/// Clones share the same buffer, so a test keeps one handle to append while the tailer
/// reads through another.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    state: Arc<Mutex<MemoryState>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bytes(bytes: &[u8]) -> Self {
        let source = Self::new();
        source.append(bytes);
        source
    }

    pub fn append(&self, bytes: &[u8]) {
        self.state().data.extend_from_slice(bytes);
    }

    pub fn truncate(&self, len: usize) {
        self.state().data.truncate(len);
    }

    /// Make the next snapshots fail with these error kinds, in order.
    pub fn fail_next(&self, kinds: &[ErrorKind]) {
        self.state().failures.extend_from_slice(kinds);
    }

    /// Number of snapshot attempts so far, failed ones included.
    pub fn reads(&self) -> u64 {
        self.state().reads
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait::async_trait]
impl SnapshotSource for MemorySource {
    async fn snapshot(&mut self) -> std::io::Result<Vec<u8>> {
        let mut state = self.state();
        state.reads += 1;
        if !state.failures.is_empty() {
            let kind = state.failures.remove(0);
            return Err(std::io::Error::new(kind, "injected failure"));
        }
        Ok(state.data.clone())
    }

    fn describe(&self) -> PathBuf {
        PathBuf::from("<memory>")
    }
}

/// Install a test subscriber honouring `RUST_LOG`; repeated calls are harmless.
#[cfg(test)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
