use std::io::Write;

use base64::Engine;
use base64::engine::general_purpose;
use http::HeaderMap;
use log::debug;
use sha1::{Digest, Sha1};

use crate::ws::Error;

/// Fixed GUID concatenated with the client key (RFC 6455 section 1.3).
pub const GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";
pub const SEC_WEBSOCKET_KEY: &str = "Sec-WebSocket-Key";
pub const SEC_WEBSOCKET_ACCEPT: &str = "Sec-WebSocket-Accept";

/// Computes the `Sec-WebSocket-Accept` token for the client supplied key.
pub fn compute_accept(client_key: &str) -> String {
    let mut sha1 = Sha1::new();
    sha1.update(client_key.trim().as_bytes());
    sha1.update(GUID.as_bytes());
    general_purpose::STANDARD.encode(sha1.finalize())
}

/// Answers the upgrade request described by `headers` with `101 Switching Protocols`.
#[cold]
pub fn negotiate<S: Write>(stream: &mut S, headers: &HeaderMap) -> Result<(), Error> {
    let key = headers
        .get(SEC_WEBSOCKET_KEY)
        .ok_or(Error::Handshake("missing Sec-WebSocket-Key header"))?
        .to_str()
        .map_err(|_| Error::Handshake("Sec-WebSocket-Key header is not visible ASCII"))?;
    let accept = compute_accept(key);
    debug!("accepting websocket upgrade with key {}", key.trim());

    stream.write_all(b"HTTP/1.1 101 Switching Protocols\r\n")?;
    stream.write_all(b"Upgrade: websocket\r\n")?;
    stream.write_all(b"Connection: Upgrade\r\n")?;
    stream.write_all(format!("{SEC_WEBSOCKET_ACCEPT}: {accept}\r\n").as_bytes())?;
    stream.write_all(b"\r\n")?;
    stream.flush()?;
    Ok(())
}
