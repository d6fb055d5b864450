//! Taking exclusive raw control of an HTTP connection.
//!
//! ## Examples
//!
//! ```no_run
//! use std::net::TcpListener;
//! use hijackws::http::hijack::TransportAcquirer;
//!
//! let listener = TcpListener::bind("127.0.0.1:8000").unwrap();
//! let (stream, _) = listener.accept().unwrap();
//! let upgrade = stream.acquire().unwrap();
//! println!("{} {}", upgrade.head.method, upgrade.head.path);
//! ```

use std::cmp::min;
use std::io;
use std::io::{Read, Write};

use http::StatusCode;
use log::warn;

use crate::http::{DEFAULT_MAX_REQUEST_HEAD_LENGTH, RequestHead, read_request_head, write_status_response};
use crate::ws::Error;

/// Hijacked connection: the owned duplex stream plus the head of the request that asked for the
/// upgrade.
#[derive(Debug)]
pub struct Upgrade<S> {
    pub stream: S,
    pub head: RequestHead,
}

/// Capability of turning an accepted connection into a raw duplex byte stream. The core calls it
/// once per connection and never looks at how the request was received.
pub trait TransportAcquirer {
    type Stream: Read + Write;

    /// Reads the request head, refusing heads longer than `max_request_head_length` bytes.
    fn acquire_with_limit(self, max_request_head_length: usize) -> Result<Upgrade<Self::Stream>, Error>;

    fn acquire(self) -> Result<Upgrade<Self::Stream>, Error>
    where
        Self: Sized,
    {
        self.acquire_with_limit(DEFAULT_MAX_REQUEST_HEAD_LENGTH)
    }
}

impl<T: Read + Write> TransportAcquirer for T {
    type Stream = HijackedStream<T>;

    fn acquire_with_limit(mut self, max_request_head_length: usize) -> Result<Upgrade<Self::Stream>, Error> {
        match read_request_head(&mut self, max_request_head_length) {
            Ok((head, leftover)) => Ok(Upgrade {
                stream: HijackedStream::new(self, leftover),
                head,
            }),
            Err(err) => {
                if matches!(err, Error::UpgradeUnsupported(_)) {
                    warn!("refusing to upgrade connection: {err}");
                    let _ = write_status_response(&mut self, StatusCode::INTERNAL_SERVER_ERROR);
                }
                Err(err)
            }
        }
    }
}

/// Stream that first replays the bytes read past the request head and then reads from the
/// underlying connection. Writes go straight to the connection.
#[derive(Debug)]
pub struct HijackedStream<S> {
    inner: S,
    leftover: Vec<u8>,
    position: usize,
}

impl<S> HijackedStream<S> {
    pub fn new(inner: S, leftover: Vec<u8>) -> Self {
        Self {
            inner,
            leftover,
            position: 0,
        }
    }
}

impl<S: Read> Read for HijackedStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.leftover.len() - self.position;
        if remaining == 0 {
            return self.inner.read(buf);
        }
        let len = min(remaining, buf.len());
        buf[..len].copy_from_slice(&self.leftover[self.position..self.position + len]);
        self.position += len;
        if self.position == self.leftover.len() {
            self.leftover = Vec::new();
            self.position = 0;
        }
        Ok(len)
    }
}

impl<S: Write> Write for HijackedStream<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
