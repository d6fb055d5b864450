use crate::ws::mask;
use crate::ws::protocol::{Opcode, status};

/// Single websocket frame with its payload already unmasked.
///
/// The masking key is present if and only if the frame is masked on the wire, so the two can
/// never disagree.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Frame {
    pub fin: bool,
    pub rsv: [bool; 3],
    pub opcode: Opcode,
    pub mask: Option<[u8; 4]>,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(fin: bool, opcode: Opcode, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            fin,
            rsv: [false; 3],
            opcode,
            mask: None,
            payload: payload.into(),
        }
    }

    pub fn text(payload: impl Into<Vec<u8>>) -> Self {
        Self::new(true, Opcode::Text, payload)
    }

    pub fn binary(payload: impl Into<Vec<u8>>) -> Self {
        Self::new(true, Opcode::Binary, payload)
    }

    pub fn ping(payload: impl Into<Vec<u8>>) -> Self {
        Self::new(true, Opcode::Ping, payload)
    }

    pub fn pong(payload: impl Into<Vec<u8>>) -> Self {
        Self::new(true, Opcode::Pong, payload)
    }

    /// Close frame whose payload is the big-endian status code.
    pub fn close(status_code: u16) -> Self {
        Self::new(true, Opcode::ConnectionClose, status_code.to_be_bytes())
    }

    /// Marks the frame as masked with the given key. The payload stays unmasked in memory, the
    /// encoder applies the key on the way out.
    pub fn with_mask(self, key: [u8; 4]) -> Self {
        Self { mask: Some(key), ..self }
    }

    pub fn with_random_mask(self) -> Self {
        self.with_mask(mask::generate_key())
    }

    pub fn with_rsv(self, rsv: [bool; 3]) -> Self {
        Self { rsv, ..self }
    }

    #[inline]
    pub const fn masked(&self) -> bool {
        self.mask.is_some()
    }

    #[inline]
    pub fn payload_length(&self) -> u64 {
        self.payload.len() as u64
    }

    /// Status code carried by a close frame. Close frames without a body report
    /// [`status::NORMAL_CLOSURE`], a single byte body is malformed and reports nothing.
    pub fn close_status_code(&self) -> Option<u16> {
        if self.opcode != Opcode::ConnectionClose {
            return None;
        }
        match self.payload.as_slice() {
            [] => Some(status::NORMAL_CLOSURE),
            [_] => None,
            [hi, lo, ..] => Some(u16::from_be_bytes([*hi, *lo])),
        }
    }
}
