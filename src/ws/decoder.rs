use std::io::Read;

use log::debug;

use crate::ws::protocol::{self, Opcode};
use crate::ws::{Error, Frame, mask};

/// Default upper bound on a single frame payload.
pub const DEFAULT_MAX_PAYLOAD_LENGTH: u64 = 16 * 1024 * 1024;

/// Blocking frame decoder. Every call to [`Decoder::decode`] reads exactly one frame off the
/// stream, blocking until the header and the whole payload have arrived.
#[derive(Debug, Copy, Clone)]
pub struct Decoder {
    max_payload_length: u64,
}

#[derive(Debug)]
enum DecodeState {
    ReadingHeader,
    ReadingPayloadLength,
    ReadingExtendedPayloadLength2,
    ReadingExtendedPayloadLength8,
    ReadingMaskingKey,
    ReadingPayload,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    pub const fn new() -> Self {
        Self::with_max_payload_length(DEFAULT_MAX_PAYLOAD_LENGTH)
    }

    pub const fn with_max_payload_length(max_payload_length: u64) -> Self {
        Self { max_payload_length }
    }

    #[inline]
    pub const fn max_payload_length(&self) -> u64 {
        self.max_payload_length
    }

    /// Reads the next frame. A stream that ends before the declared payload length has been
    /// satisfied fails with [`Error::Transport`], never with a truncated frame.
    pub fn decode<S: Read>(&self, stream: &mut S) -> Result<Frame, Error> {
        let mut decode_state = DecodeState::ReadingHeader;
        let mut fin = false;
        let mut rsv = [false; 3];
        let mut op_code = Opcode::Continuation;
        let mut masked = false;
        let mut mask = None;
        let mut payload_length = 0u64;

        loop {
            match decode_state {
                DecodeState::ReadingHeader => {
                    let [b] = read_array::<_, 1>(stream)?;
                    fin = protocol::fin(b);
                    rsv = protocol::rsv(b);
                    op_code = Opcode::try_from(protocol::op_code(b))?;
                    decode_state = DecodeState::ReadingPayloadLength;
                }
                DecodeState::ReadingPayloadLength => {
                    let [b] = read_array::<_, 1>(stream)?;
                    masked = protocol::masked(b);
                    let length_indicator = protocol::length_indicator(b);
                    payload_length = length_indicator as u64;
                    decode_state = match length_indicator {
                        protocol::EXTENDED_PAYLOAD_LENGTH_2 => DecodeState::ReadingExtendedPayloadLength2,
                        protocol::EXTENDED_PAYLOAD_LENGTH_8 => DecodeState::ReadingExtendedPayloadLength8,
                        _ => DecodeState::ReadingMaskingKey,
                    };
                }
                DecodeState::ReadingExtendedPayloadLength2 => {
                    payload_length = u16::from_be_bytes(read_array(stream)?) as u64;
                    decode_state = DecodeState::ReadingMaskingKey;
                }
                DecodeState::ReadingExtendedPayloadLength8 => {
                    payload_length = u64::from_be_bytes(read_array(stream)?) & protocol::EXTENDED_PAYLOAD_LENGTH_8_MASK;
                    decode_state = DecodeState::ReadingMaskingKey;
                }
                DecodeState::ReadingMaskingKey => {
                    if masked {
                        mask = Some(read_array(stream)?);
                    }
                    decode_state = DecodeState::ReadingPayload;
                }
                DecodeState::ReadingPayload => {
                    if payload_length > self.max_payload_length {
                        return Err(Error::PayloadTooLarge {
                            length: payload_length,
                            limit: self.max_payload_length,
                        });
                    }
                    let len = usize::try_from(payload_length).map_err(|_| Error::PayloadTooLarge {
                        length: payload_length,
                        limit: usize::MAX as u64,
                    })?;
                    let mut payload = vec![0u8; len];
                    stream.read_exact(&mut payload)?;
                    if let Some(key) = mask {
                        mask::apply(&mut payload, key);
                    }
                    debug!("decoded {op_code} frame: fin={fin}, masked={masked}, payload_length={payload_length}");
                    return Ok(Frame {
                        fin,
                        rsv,
                        opcode: op_code,
                        mask,
                        payload,
                    });
                }
            }
        }
    }
}

#[inline]
fn read_array<S: Read, const N: usize>(stream: &mut S) -> Result<[u8; N], Error> {
    let mut bytes = [0u8; N];
    stream.read_exact(&mut bytes)?;
    Ok(bytes)
}
