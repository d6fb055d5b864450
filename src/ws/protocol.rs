//! Canonical websocket frame header layout (RFC 6455 section 5.2).
//!
//! ```text
//! byte0 = FIN<<7 | RSV0<<6 | RSV1<<5 | RSV2<<4 | OPCODE
//! byte1 = MASK<<7 | LENGTH_INDICATOR
//! ```
//!
//! Both the decoder and the encoder go through the accessors and builders below, so the bit
//! positions are defined exactly once.

use std::fmt::{Display, Formatter};

use crate::ws::Error;

pub const FIN_MASK: u8 = 0b1000_0000;
pub const RSV1_MASK: u8 = 0b0100_0000;
pub const RSV2_MASK: u8 = 0b0010_0000;
pub const RSV3_MASK: u8 = 0b0001_0000;
pub const OP_CODE_MASK: u8 = 0b0000_1111;
pub const MASK_MASK: u8 = 0b1000_0000;
pub const PAYLOAD_LENGTH_MASK: u8 = 0b0111_1111;

const RSV_MASKS: [u8; 3] = [RSV1_MASK, RSV2_MASK, RSV3_MASK];

/// Largest payload length that fits into the length indicator itself.
pub const MAX_INLINE_PAYLOAD_LENGTH: u8 = 125;
/// Length indicator announcing a 16-bit extended payload length.
pub const EXTENDED_PAYLOAD_LENGTH_2: u8 = 126;
/// Length indicator announcing a 64-bit extended payload length.
pub const EXTENDED_PAYLOAD_LENGTH_8: u8 = 127;
/// The most significant bit of the 64-bit extended length is reserved and must be zero.
pub const EXTENDED_PAYLOAD_LENGTH_8_MASK: u64 = !(1 << 63);

pub mod op {
    pub const CONTINUATION_FRAME: u8 = 0x0;
    pub const TEXT_FRAME: u8 = 0x1;
    pub const BINARY_FRAME: u8 = 0x2;
    pub const CONNECTION_CLOSE: u8 = 0x8;
    pub const PING: u8 = 0x9;
    pub const PONG: u8 = 0xA;
}

/// Close frame status codes (RFC 6455 section 7.4.1).
pub mod status {
    pub const NORMAL_CLOSURE: u16 = 1000;
    pub const GOING_AWAY: u16 = 1001;
    pub const PROTOCOL_ERROR: u16 = 1002;
    pub const MESSAGE_TOO_BIG: u16 = 1009;
    pub const INTERNAL_ERROR: u16 = 1011;
}

/// Frame opcodes this implementation understands. Reserved values (3-7, 11-15) have no variant
/// and are rejected by [`Opcode::try_from`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum Opcode {
    Continuation = op::CONTINUATION_FRAME,
    Text = op::TEXT_FRAME,
    Binary = op::BINARY_FRAME,
    ConnectionClose = op::CONNECTION_CLOSE,
    Ping = op::PING,
    Pong = op::PONG,
}

/// What the connection does with a decoded frame of a given opcode.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Policy {
    /// Answer on the protocol level without involving the application.
    AutoReply,
    /// Hand the frame over to the application handler.
    Forward,
    /// Stop reading and close the connection.
    Terminate,
    /// Drop the frame.
    Ignore,
}

impl Opcode {
    #[inline]
    pub const fn is_control(self) -> bool {
        self as u8 >= op::CONNECTION_CLOSE
    }

    /// Dispatch table mapping each opcode to its lifecycle policy.
    #[inline]
    pub const fn policy(self) -> Policy {
        match self {
            Opcode::Continuation | Opcode::Text | Opcode::Binary => Policy::Forward,
            Opcode::Ping => Policy::AutoReply,
            Opcode::ConnectionClose => Policy::Terminate,
            Opcode::Pong => Policy::Ignore,
        }
    }
}

impl TryFrom<u8> for Opcode {
    type Error = Error;

    #[inline]
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            op::CONTINUATION_FRAME => Ok(Opcode::Continuation),
            op::TEXT_FRAME => Ok(Opcode::Text),
            op::BINARY_FRAME => Ok(Opcode::Binary),
            op::CONNECTION_CLOSE => Ok(Opcode::ConnectionClose),
            op::PING => Ok(Opcode::Ping),
            op::PONG => Ok(Opcode::Pong),
            _ => Err(Error::Protocol("unknown op_code")),
        }
    }
}

impl From<Opcode> for u8 {
    #[inline]
    fn from(op_code: Opcode) -> Self {
        op_code as u8
    }
}

impl Display for Opcode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Opcode::Continuation => "continuation",
            Opcode::Text => "text",
            Opcode::Binary => "binary",
            Opcode::ConnectionClose => "close",
            Opcode::Ping => "ping",
            Opcode::Pong => "pong",
        };
        f.write_str(name)
    }
}

#[inline]
pub const fn fin(b0: u8) -> bool {
    b0 & FIN_MASK != 0
}

/// RSV bits, most significant first.
#[inline]
pub const fn rsv(b0: u8) -> [bool; 3] {
    [b0 & RSV1_MASK != 0, b0 & RSV2_MASK != 0, b0 & RSV3_MASK != 0]
}

#[inline]
pub const fn op_code(b0: u8) -> u8 {
    b0 & OP_CODE_MASK
}

#[inline]
pub const fn masked(b1: u8) -> bool {
    b1 & MASK_MASK != 0
}

#[inline]
pub const fn length_indicator(b1: u8) -> u8 {
    b1 & PAYLOAD_LENGTH_MASK
}

/// Packs FIN, RSV and opcode into the first header byte.
#[inline]
pub fn pack_first(fin: bool, rsv: [bool; 3], op_code: Opcode) -> u8 {
    let mut b0 = u8::from(op_code);
    if fin {
        b0 |= FIN_MASK;
    }
    for (bit, mask) in rsv.iter().zip(RSV_MASKS) {
        if *bit {
            b0 |= mask;
        }
    }
    b0
}

/// Packs the mask flag and the length indicator into the second header byte.
#[inline]
pub const fn pack_second(masked: bool, length_indicator: u8) -> u8 {
    let mut b1 = length_indicator & PAYLOAD_LENGTH_MASK;
    if masked {
        b1 |= MASK_MASK;
    }
    b1
}

/// Number of extended payload length bytes that follow a given length indicator.
#[inline]
pub const fn extended_length_size(length_indicator: u8) -> usize {
    match length_indicator {
        EXTENDED_PAYLOAD_LENGTH_2 => 2,
        EXTENDED_PAYLOAD_LENGTH_8 => 8,
        _ => 0,
    }
}

/// Picks the shortest length indicator able to carry `payload_length`.
#[inline]
pub const fn length_indicator_for(payload_length: u64) -> u8 {
    if payload_length <= MAX_INLINE_PAYLOAD_LENGTH as u64 {
        payload_length as u8
    } else if payload_length <= u16::MAX as u64 {
        EXTENDED_PAYLOAD_LENGTH_2
    } else {
        EXTENDED_PAYLOAD_LENGTH_8
    }
}
