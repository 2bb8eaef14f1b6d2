//! Payload decoding for framed records.
//!
//! The tailer frames records itself and hands each payload to an [`EventDecoder`]. The
//! decoder is called once per record in the hot loop, so implementations should be pure
//! functions over the payload slice.

use thiserror::Error;

use super::format::tags;
use crate::types::{
    Event, FrameData, FrameEvent, FrameId, GameEnd, GameStart, Position, PostFrame, PreFrame,
};

/// Failure to turn a framed payload into an [`Event`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Payload for {tag:#04x} is {available} bytes, need at least {needed}")]
    Truncated { tag: u8, needed: usize, available: usize },

    #[error("Invalid payload for {tag:#04x}: {details}")]
    Invalid { tag: u8, details: String },
}

/// Turns a tag and its fixed-size payload into a typed event.
pub trait EventDecoder: Send + Sync + 'static {
    /// Decode one record.
    ///
    /// Returns:
    /// - `Ok(Some(event))` - record decoded
    /// - `Ok(None)` - record carries no state a live session tracks and is skipped
    /// - `Err(e)` - payload could not be decoded
    fn decode(&self, tag: u8, payload: &[u8]) -> Result<Option<Event>, DecodeError>;
}

impl<F> EventDecoder for F
where
    F: Fn(u8, &[u8]) -> Result<Option<Event>, DecodeError> + Send + Sync + 'static,
{
    fn decode(&self, tag: u8, payload: &[u8]) -> Result<Option<Event>, DecodeError> {
        self(tag, payload)
    }
}

/// Decoder for the Slippi event set.
///
/// Frame start, item, bookend, gecko list and message splitter records are skipped, as are
/// tags Slippi does not define. A second Event Payloads record surfaces as
/// [`Event::Other`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SlippiDecoder;

// Field offsets within payloads (tag byte excluded)
const PRE_FRAME_MIN_LEN: usize = 48;
const POST_FRAME_MIN_LEN: usize = 33;
const GAME_START_MIN_LEN: usize = 13;
const GAME_END_MIN_LEN: usize = 1;

impl EventDecoder for SlippiDecoder {
    fn decode(&self, tag: u8, payload: &[u8]) -> Result<Option<Event>, DecodeError> {
        let event = match tag {
            tags::GAME_START => Event::Start(decode_game_start(payload)?),
            tags::PRE_FRAME => {
                let reader = PayloadReader::new(tag, payload, PRE_FRAME_MIN_LEN)?;
                Event::Frame(FrameEvent {
                    id: reader.frame_id()?,
                    data: FrameData::Pre(decode_pre_frame(&reader)?),
                })
            }
            tags::POST_FRAME => {
                let reader = PayloadReader::new(tag, payload, POST_FRAME_MIN_LEN)?;
                Event::Frame(FrameEvent {
                    id: reader.frame_id()?,
                    data: FrameData::Post(decode_post_frame(&reader)?),
                })
            }
            tags::GAME_END => Event::End(decode_game_end(payload)?),
            tags::EVENT_PAYLOADS => Event::Other(tag),
            tags::FRAME_START
            | tags::ITEM
            | tags::FRAME_BOOKEND
            | tags::GECKO_LIST
            | tags::MESSAGE_SPLITTER => return Ok(None),
            _ => return Ok(None),
        };
        Ok(Some(event))
    }
}

fn decode_game_start(payload: &[u8]) -> Result<GameStart, DecodeError> {
    let reader = PayloadReader::new(tags::GAME_START, payload, GAME_START_MIN_LEN)?;
    Ok(GameStart {
        slippi_version: (reader.u8(0)?, reader.u8(1)?, reader.u8(2)?),
        is_teams: reader.u8(12)? != 0,
    })
}

fn decode_pre_frame(reader: &PayloadReader<'_>) -> Result<PreFrame, DecodeError> {
    Ok(PreFrame {
        random_seed: reader.u32(6)?,
        state: reader.u16(10)?,
        position: Position { x: reader.f32(12)?, y: reader.f32(16)? },
        direction: reader.f32(20)?,
        joystick: Position { x: reader.f32(24)?, y: reader.f32(28)? },
        cstick: Position { x: reader.f32(32)?, y: reader.f32(36)? },
        trigger: reader.f32(40)?,
        buttons: reader.u32(44)?,
    })
}

fn decode_post_frame(reader: &PayloadReader<'_>) -> Result<PostFrame, DecodeError> {
    Ok(PostFrame {
        character: reader.u8(6)?,
        state: reader.u16(7)?,
        position: Position { x: reader.f32(9)?, y: reader.f32(13)? },
        direction: reader.f32(17)?,
        damage: reader.f32(21)?,
        shield: reader.f32(25)?,
        last_attack_landed: reader.u8(29)?,
        combo_count: reader.u8(30)?,
        last_hit_by: reader.u8(31)?,
        stocks: reader.u8(32)?,
    })
}

fn decode_game_end(payload: &[u8]) -> Result<GameEnd, DecodeError> {
    let reader = PayloadReader::new(tags::GAME_END, payload, GAME_END_MIN_LEN)?;
    // Older replays stop after the method byte; -1 marks "no initiator"
    let lras_initiator = match payload.get(1) {
        Some(&b) if (b as i8) >= 0 => Some(b),
        _ => None,
    };
    Ok(GameEnd { method: reader.u8(0)?.into(), lras_initiator })
}

/// Bounds-checked big-endian field access over one payload.
struct PayloadReader<'a> {
    tag: u8,
    data: &'a [u8],
}

impl<'a> PayloadReader<'a> {
    fn new(tag: u8, data: &'a [u8], min_len: usize) -> Result<Self, DecodeError> {
        if data.len() < min_len {
            return Err(DecodeError::Truncated { tag, needed: min_len, available: data.len() });
        }
        Ok(Self { tag, data })
    }

    fn bytes<const N: usize>(&self, offset: usize) -> Result<[u8; N], DecodeError> {
        self.data
            .get(offset..offset + N)
            .and_then(|slice| slice.try_into().ok())
            .ok_or(DecodeError::Truncated {
                tag: self.tag,
                needed: offset + N,
                available: self.data.len(),
            })
    }

    fn u8(&self, offset: usize) -> Result<u8, DecodeError> {
        Ok(self.bytes::<1>(offset)?[0])
    }

    fn u16(&self, offset: usize) -> Result<u16, DecodeError> {
        Ok(u16::from_be_bytes(self.bytes(offset)?))
    }

    fn u32(&self, offset: usize) -> Result<u32, DecodeError> {
        Ok(u32::from_be_bytes(self.bytes(offset)?))
    }

    fn i32(&self, offset: usize) -> Result<i32, DecodeError> {
        Ok(i32::from_be_bytes(self.bytes(offset)?))
    }

    fn f32(&self, offset: usize) -> Result<f32, DecodeError> {
        Ok(f32::from_be_bytes(self.bytes(offset)?))
    }

    fn frame_id(&self) -> Result<FrameId, DecodeError> {
        let is_follower = match self.u8(5)? {
            0 => false,
            1 => true,
            other => {
                return Err(DecodeError::Invalid {
                    tag: self.tag,
                    details: format!("follower flag must be 0 or 1, found {}", other),
                });
            }
        };
        Ok(FrameId { frame: self.i32(0)?, port: self.u8(4)?, is_follower })
    }
}
