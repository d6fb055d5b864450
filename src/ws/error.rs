use std::io;
use std::io::ErrorKind::Other;
use thiserror::Error;

use crate::ws::protocol::status;

#[derive(Error, Debug)]
pub enum Error {
    #[error("connection cannot be upgraded: {0}")]
    UpgradeUnsupported(String),
    #[error("websocket handshake error: {0}")]
    Handshake(&'static str),
    #[error("websocket protocol error: {0}")]
    Protocol(&'static str),
    #[error("frame payload of {length} bytes exceeds the limit of {limit} bytes")]
    PayloadTooLarge { length: u64, limit: u64 },
    #[error("the websocket is closed and can be dropped")]
    Closed,
    #[error("IO error: {0}")]
    Transport(#[from] io::Error),
}

impl Error {
    /// Status code to send to the peer before tearing the connection down, if the failure is one
    /// the peer should be told about.
    pub const fn close_code(&self) -> Option<u16> {
        match self {
            Error::Protocol(_) => Some(status::PROTOCOL_ERROR),
            Error::PayloadTooLarge { .. } => Some(status::MESSAGE_TOO_BIG),
            _ => None,
        }
    }
}

impl From<Error> for io::Error {
    fn from(value: Error) -> Self {
        match value {
            Error::Transport(err) => err,
            other => io::Error::new(Other, other),
        }
    }
}
