//! Slippi replay stream layout and payload-size table parsing
//!
//! ## Stream Structure
//!
//! A `.slp` file being written by the game looks like this:
//!
//! 1. **Raw preamble** (15 bytes) - UBJSON `{U\x03raw[$U#l` followed by a big-endian u32 raw
//!    length, left at 0 until the game finishes
//! 2. **Event Payloads record** - tag `0x35`, a one-byte size `N` that counts itself, then
//!    `(N - 1) / 3` entries of `(tag: u8, payload size: u16 BE)`
//! 3. **Records** - densely packed `(tag: u8, payload)` pairs, each payload exactly as long
//!    as the table declares for its tag
//!
//! The preamble and the Event Payloads record together form the header region. Everything
//! after it can only be framed through the table, so a record is never read until its whole
//! payload is present in the snapshot.

use std::collections::HashMap;
use tracing::{debug, trace};

use crate::{LiveError, Result};

/// UBJSON prefix the game writes before the raw event element.
pub const RAW_PREFIX: [u8; 11] = *b"{U\x03raw[$U#l";

/// Preamble length: prefix plus the big-endian raw length.
pub const RAW_PREAMBLE_LEN: usize = RAW_PREFIX.len() + 4;

/// Event tags written by Slippi.
pub mod tags {
    pub const MESSAGE_SPLITTER: u8 = 0x10;
    pub const EVENT_PAYLOADS: u8 = 0x35;
    pub const GAME_START: u8 = 0x36;
    pub const PRE_FRAME: u8 = 0x37;
    pub const POST_FRAME: u8 = 0x38;
    pub const GAME_END: u8 = 0x39;
    pub const FRAME_START: u8 = 0x3a;
    pub const ITEM: u8 = 0x3b;
    pub const FRAME_BOOKEND: u8 = 0x3c;
    pub const GECKO_LIST: u8 = 0x3d;
}

/// Outcome of probing a snapshot for the header region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderProbe {
    /// The snapshot must hold at least `needed` bytes before the header can be parsed.
    Incomplete { needed: usize },
    Ready(PayloadSizeTable),
}

/// Payload byte length for every tag the session may encounter.
///
/// Built once from the header region and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadSizeTable {
    sizes: HashMap<u8, usize>,
    min_payload: usize,
    max_payload: usize,
    header_len: usize,
}

impl PayloadSizeTable {
    /// Build a table from `(tag, size)` pairs, for a header region `header_len` bytes long.
    pub fn new(sizes: HashMap<u8, usize>, header_len: usize) -> Result<Self> {
        let min_payload = sizes.values().copied().min();
        let max_payload = sizes.values().copied().max();
        match (min_payload, max_payload) {
            (Some(min_payload), Some(max_payload)) => {
                Ok(Self { sizes, min_payload, max_payload, header_len })
            }
            _ => Err(LiveError::malformed_header("Payload size table declares no events")),
        }
    }

    /// Parse the header region from the start of a snapshot.
    ///
    /// Returns [`HeaderProbe::Incomplete`] while the game has not written enough bytes yet.
    /// Bytes already present are still checked, so a file that is not a replay fails on the
    /// first probe instead of being waited on.
    pub fn probe(data: &[u8]) -> Result<HeaderProbe> {
        let prefix_len = data.len().min(RAW_PREFIX.len());
        if data[..prefix_len] != RAW_PREFIX[..prefix_len] {
            return Err(LiveError::malformed_header("Missing raw element preamble"));
        }

        // Tag plus size byte of the Event Payloads record
        let table_start = RAW_PREAMBLE_LEN;
        if data.len() < table_start + 2 {
            return Ok(HeaderProbe::Incomplete { needed: table_start + 2 });
        }

        let tag = data[table_start];
        if tag != tags::EVENT_PAYLOADS {
            return Err(LiveError::malformed_header(format!(
                "Expected event payloads record ({:#04x}), found {:#04x}",
                tags::EVENT_PAYLOADS,
                tag
            )));
        }

        // The declared size counts the size byte itself
        let declared = data[table_start + 1] as usize;
        if declared == 0 {
            return Err(LiveError::malformed_header("Event payloads record has zero size"));
        }
        let entries_len = declared - 1;
        if entries_len % 3 != 0 {
            return Err(LiveError::malformed_header(format!(
                "Event payloads size {} is not a whole number of entries",
                entries_len
            )));
        }

        let entries_start = table_start + 2;
        let header_len = entries_start + entries_len;
        if data.len() < header_len {
            return Ok(HeaderProbe::Incomplete { needed: header_len });
        }

        let mut sizes = HashMap::with_capacity(entries_len / 3);
        for entry in data[entries_start..header_len].chunks_exact(3) {
            let size = u16::from_be_bytes([entry[1], entry[2]]) as usize;
            trace!("Payload size for {:#04x}: {}", entry[0], size);
            sizes.insert(entry[0], size);
        }

        let table = Self::new(sizes, header_len)?;
        debug!(
            "Parsed payload size table: {} events, header {} bytes, payloads {}..={}",
            table.len(),
            table.header_len,
            table.min_payload,
            table.max_payload
        );
        Ok(HeaderProbe::Ready(table))
    }

    pub fn payload_size(&self, tag: u8) -> Option<usize> {
        self.sizes.get(&tag).copied()
    }

    /// Bytes occupied by the header region; the first record starts here.
    pub fn header_len(&self) -> usize {
        self.header_len
    }

    /// Smallest complete record (tag + payload) the table allows.
    pub fn min_record_len(&self) -> usize {
        1 + self.min_payload
    }

    /// Largest complete record (tag + payload) the table allows.
    pub fn max_record_len(&self) -> usize {
        1 + self.max_payload
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}

/// A record located in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordProbe<'a> {
    /// The record starting at the offset is not fully written yet.
    Incomplete,
    Complete { tag: u8, payload: &'a [u8] },
}

impl RecordProbe<'_> {
    /// Bytes the record occupies in the stream, tag included; 0 while incomplete.
    pub fn record_len(&self) -> usize {
        match self {
            RecordProbe::Incomplete => 0,
            RecordProbe::Complete { payload, .. } => 1 + payload.len(),
        }
    }
}

/// Locate the record starting at `offset` without consuming anything.
pub fn frame_record<'a>(
    data: &'a [u8],
    offset: usize,
    table: &PayloadSizeTable,
) -> Result<RecordProbe<'a>> {
    let Some(&tag) = data.get(offset) else {
        return Ok(RecordProbe::Incomplete);
    };

    let size = table.payload_size(tag).ok_or(LiveError::UnknownEventTag { tag, offset })?;

    let start = offset + 1;
    let end = start + size;
    if end > data.len() {
        return Ok(RecordProbe::Incomplete);
    }

    Ok(RecordProbe::Complete { tag, payload: &data[start..end] })
}
