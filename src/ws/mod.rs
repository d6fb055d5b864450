//! Websocket server side protocol implementation on top of a hijacked byte stream.
//!
//! ## Examples
//!
//! Drive a hijacked connection through the handshake and echo every data frame back.
//! ```no_run
//! use std::net::TcpStream;
//! use hijackws::http::hijack::TransportAcquirer;
//! use hijackws::ws::handler::Echo;
//! use hijackws::ws::Websocket;
//!
//! fn serve(stream: TcpStream) -> Result<(), hijackws::ws::Error> {
//!     let upgrade = stream.acquire()?;
//!     let mut ws = Websocket::new(upgrade.stream, upgrade.head.headers);
//!     ws.handshake()?;
//!     ws.run(&mut Echo)
//! }
//! ```
//!
//! Handle frames with a closure instead.
//! ```no_run
//! use std::io::{Read, Write};
//! use hijackws::ws::{Error, Frame, Websocket};
//!
//! fn shout<S: Read + Write>(ws: &mut Websocket<S>) -> Result<(), Error> {
//!     ws.run(&mut |ws: &mut Websocket<S>, frame: Frame| {
//!         ws.send_text(true, &frame.payload.to_ascii_uppercase())
//!     })
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::io::{Read, Write};

use http::{HeaderMap, StatusCode};
use log::{debug, warn};

use crate::http::write_status_response;
use crate::ws::decoder::Decoder;
use crate::ws::handler::Handler;
use crate::ws::protocol::{MAX_INLINE_PAYLOAD_LENGTH, Opcode, Policy, status};

// re-export
pub use crate::ws::error::Error;
pub use crate::ws::frame::Frame;

pub mod decoder;
pub mod encoder;
mod error;
mod frame;
pub mod handler;
pub mod handshake;
pub mod mask;
pub mod protocol;

/// Connection lifecycle states.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum State {
    /// Stream acquired, upgrade response not sent yet.
    Handshake,
    Open,
    /// Close frame has been sent or received.
    Closing,
    /// Terminal, the stream has been released.
    Closed,
}

impl Display for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            State::Handshake => "handshake",
            State::Open => "open",
            State::Closing => "closing",
            State::Closed => "closed",
        })
    }
}

/// Server side websocket that owns the underlying stream. The stream is released exactly once,
/// either by [`Websocket::close`] or as soon as it faults.
#[derive(Debug)]
pub struct Websocket<S> {
    stream: Option<S>,
    headers: HeaderMap,
    close_status_code: u16,
    require_masked_frames: bool,
    decoder: Decoder,
    state: State,
}

impl<S> Websocket<S> {
    /// Wraps a hijacked stream together with the headers of the upgrade request.
    pub fn new(stream: S, headers: HeaderMap) -> Self {
        Self {
            stream: Some(stream),
            headers,
            close_status_code: status::NORMAL_CLOSURE,
            require_masked_frames: true,
            decoder: Decoder::new(),
            state: State::Handshake,
        }
    }

    /// Status code sent when this side initiates the close.
    pub fn with_close_status_code(self, close_status_code: u16) -> Self {
        Self {
            close_status_code,
            ..self
        }
    }

    pub fn with_max_payload_length(self, max_payload_length: u64) -> Self {
        Self {
            decoder: Decoder::with_max_payload_length(max_payload_length),
            ..self
        }
    }

    /// Whether unmasked frames from the peer are treated as protocol violations.
    pub fn with_require_masked_frames(self, require_masked_frames: bool) -> Self {
        Self {
            require_masked_frames,
            ..self
        }
    }

    #[inline]
    pub const fn state(&self) -> State {
        self.state
    }

    /// Checks if the websocket is closed. This can be result of an IO error, a protocol violation
    /// or either side closing the connection.
    #[inline]
    pub const fn closed(&self) -> bool {
        matches!(self.state, State::Closed)
    }

    #[inline]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[inline]
    pub const fn close_status_code(&self) -> u16 {
        self.close_status_code
    }

    #[inline]
    fn stream(&mut self) -> Result<&mut S, Error> {
        self.stream.as_mut().ok_or(Error::Closed)
    }

    fn release(&mut self) {
        if self.stream.take().is_some() {
            debug!("websocket stream released in {} state", self.state);
        }
        self.state = State::Closed;
    }
}

impl<S: Read + Write> Websocket<S> {
    /// Sends the `101 Switching Protocols` response. A request without a usable
    /// `Sec-WebSocket-Key` is answered with `500 Internal Server Error` and the stream released.
    pub fn handshake(&mut self) -> Result<(), Error> {
        if self.state != State::Handshake {
            return Err(Error::Handshake("handshake already performed"));
        }
        let stream = self.stream.as_mut().ok_or(Error::Closed)?;
        match handshake::negotiate(stream, &self.headers) {
            Ok(()) => {
                self.state = State::Open;
                Ok(())
            }
            Err(err) => {
                if matches!(err, Error::Handshake(_)) {
                    let _ = write_status_response(stream, StatusCode::INTERNAL_SERVER_ERROR);
                }
                self.release();
                Err(err)
            }
        }
    }

    /// Blocks until the next frame has been received. Frames violating the protocol close the
    /// connection with the matching status code before the error is returned.
    pub fn receive_next(&mut self) -> Result<Frame, Error> {
        self.ensure_open()?;
        let decoder = self.decoder;
        let frame = decoder
            .decode(self.stream()?)
            .and_then(|frame| self.validate(frame))
            .map_err(|err| self.abort(err))?;
        Ok(frame)
    }

    #[inline]
    pub fn send(&mut self, frame: &Frame) -> Result<(), Error> {
        self.ensure_open()?;
        encoder::send(self.stream()?, frame).map_err(|err| self.abort(err.into()))
    }

    #[inline]
    pub fn send_text(&mut self, fin: bool, body: &[u8]) -> Result<(), Error> {
        self.send(&Frame::new(fin, Opcode::Text, body))
    }

    #[inline]
    pub fn send_binary(&mut self, fin: bool, body: &[u8]) -> Result<(), Error> {
        self.send(&Frame::new(fin, Opcode::Binary, body))
    }

    #[inline]
    pub fn send_ping(&mut self, body: &[u8]) -> Result<(), Error> {
        self.send(&Frame::ping(body))
    }

    #[inline]
    pub fn send_pong(&mut self, body: &[u8]) -> Result<(), Error> {
        self.send(&Frame::pong(body))
    }

    /// Runs the frame loop until the connection is closed by the peer or fails. Pings are
    /// answered automatically, data frames are forwarded to `handler`.
    pub fn run<H: Handler<S>>(&mut self, handler: &mut H) -> Result<(), Error> {
        loop {
            let mut frame = self.receive_next()?;
            match frame.opcode.policy() {
                Policy::Terminate => {
                    debug!("received close frame with status code {:?}", frame.close_status_code());
                    self.state = State::Closing;
                    return self.close();
                }
                Policy::AutoReply => {
                    frame.opcode = Opcode::Pong;
                    frame.mask = None;
                    self.send(&frame)?;
                }
                Policy::Forward => {
                    if let Err(err) = handler.on_frame(self, frame) {
                        return Err(self.abort(err));
                    }
                    // handler initiated the close
                    if self.closed() {
                        return Ok(());
                    }
                }
                Policy::Ignore => debug!("ignoring {} frame", frame.opcode),
            }
        }
    }

    /// Sends a close frame carrying the configured status code and releases the stream. Closing
    /// an already closed websocket is a no-op.
    #[inline]
    pub fn close(&mut self) -> Result<(), Error> {
        self.close_with(self.close_status_code)
    }

    pub fn close_with(&mut self, status_code: u16) -> Result<(), Error> {
        let result = match (self.state, self.stream.as_mut()) {
            (State::Open | State::Closing, Some(stream)) => {
                self.state = State::Closing;
                debug!("sending close frame with status code {status_code}");
                encoder::send(stream, &Frame::close(status_code)).map_err(Error::from)
            }
            _ => Ok(()),
        };
        self.release();
        result
    }

    #[inline]
    const fn ensure_open(&self) -> Result<(), Error> {
        match self.state {
            State::Open => Ok(()),
            State::Handshake => Err(Error::Handshake("handshake not performed")),
            State::Closing | State::Closed => Err(Error::Closed),
        }
    }

    fn validate(&self, frame: Frame) -> Result<Frame, Error> {
        if frame.rsv.iter().any(|bit| *bit) {
            return Err(Error::Protocol("non zero RSV value received"));
        }
        if self.require_masked_frames && !frame.masked() {
            return Err(Error::Protocol("masking bit not set on the client frame"));
        }
        if frame.opcode.is_control() {
            if !frame.fin {
                return Err(Error::Protocol("fragmented control frame"));
            }
            if frame.payload_length() > MAX_INLINE_PAYLOAD_LENGTH as u64 {
                return Err(Error::Protocol("control frame payload too long"));
            }
            if frame.opcode == Opcode::ConnectionClose && frame.payload_length() == 1 {
                return Err(Error::Protocol("close frame body too short for a status code"));
            }
        }
        Ok(frame)
    }

    /// Tears the connection down after `err`, telling the peer why when the error maps to a close
    /// status code.
    fn abort(&mut self, err: Error) -> Error {
        match (&err, err.close_code()) {
            (_, Some(status_code)) => {
                warn!("closing websocket with status code {status_code}: {err}");
                let _ = self.close_with(status_code);
            }
            (Error::Transport(_), None) => self.release(),
            _ => {}
        }
        err
    }
}
