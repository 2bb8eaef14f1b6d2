//! Slippi replay stream support
//!
//! Framing (header region, payload-size table, record boundaries) lives in [`format`];
//! payload decoding lives behind the [`EventDecoder`] trait in [`decoder`].

pub mod decoder;
pub mod format;

pub use decoder::{DecodeError, EventDecoder, SlippiDecoder};
pub use format::{HeaderProbe, PayloadSizeTable, RecordProbe, frame_record};
