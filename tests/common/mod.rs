//! Shared helpers for integration tests: a byte-exact replay writer and log setup.

#![allow(dead_code)]

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

const PREAMBLE: &[u8] = b"{U\x03raw[$U#l\x00\x00\x00\x00";

const GAME_START: u8 = 0x36;
const PRE_FRAME: u8 = 0x37;
const POST_FRAME: u8 = 0x38;
const GAME_END: u8 = 0x39;
const FRAME_START: u8 = 0x3a;
const FRAME_BOOKEND: u8 = 0x3c;

const SIZES: &[(u8, u16)] = &[
    (GAME_START, 420),
    (PRE_FRAME, 63),
    (POST_FRAME, 80),
    (GAME_END, 2),
    (FRAME_START, 12),
    (FRAME_BOOKEND, 8),
];

fn record(tag: u8, fill: impl FnOnce(&mut [u8])) -> Vec<u8> {
    let size = SIZES.iter().find(|&&(t, _)| t == tag).map(|&(_, s)| s as usize).unwrap_or(0);
    let mut bytes = vec![0u8; size + 1];
    bytes[0] = tag;
    fill(&mut bytes[1..]);
    bytes
}

/// Header block: raw preamble plus the Event Payloads record.
pub fn header() -> Vec<u8> {
    let mut bytes = PREAMBLE.to_vec();
    bytes.push(0x35);
    bytes.push((SIZES.len() * 3 + 1) as u8);
    for &(tag, size) in SIZES {
        bytes.push(tag);
        bytes.extend_from_slice(&size.to_be_bytes());
    }
    bytes
}

pub fn game_start() -> Vec<u8> {
    record(GAME_START, |p| p[..3].copy_from_slice(&[3, 16, 0]))
}

/// Frame start, pre and post records for every port, then the bookend.
pub fn frame(index: i32, ports: &[u8]) -> Vec<u8> {
    let mut bytes = record(FRAME_START, |p| p[..4].copy_from_slice(&index.to_be_bytes()));
    for &port in ports {
        bytes.extend(record(PRE_FRAME, |p| {
            p[..4].copy_from_slice(&index.to_be_bytes());
            p[4] = port;
            p[12..16].copy_from_slice(&(index as f32).to_be_bytes());
        }));
    }
    for &port in ports {
        bytes.extend(record(POST_FRAME, |p| {
            p[..4].copy_from_slice(&index.to_be_bytes());
            p[4] = port;
            p[32] = 4;
        }));
    }
    bytes.extend(record(FRAME_BOOKEND, |p| p[..4].copy_from_slice(&index.to_be_bytes())));
    bytes
}

pub fn game_end(method: u8) -> Vec<u8> {
    record(GAME_END, |p| {
        p[0] = method;
        p[1] = 0xff;
    })
}

/// A full replay with `frames` frames starting at -123.
pub fn full_game(frames: i32, ports: &[u8]) -> Vec<u8> {
    let mut bytes = header();
    bytes.extend(game_start());
    for index in -123..(-123 + frames) {
        bytes.extend(frame(index, ports));
    }
    bytes.extend(game_end(2));
    bytes
}

/// Append bytes to a file the way the game does, flushing after each write.
pub fn append(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file: File = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(bytes)?;
    file.flush()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
