//! Minimal HTTP/1.1 plumbing needed to take over a connection: reading the upgrade request head
//! and answering requests that cannot be upgraded.

use std::io;
use std::io::{Read, Write};

use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method, StatusCode};
use httparse::{EMPTY_HEADER, Request, Status};
use memchr::arch::all::rabinkarp::Finder;

use crate::buffer::ReadBuffer;
use crate::ws::Error;

pub mod hijack;

/// Default upper bound on the size of a request head.
pub const DEFAULT_MAX_REQUEST_HEAD_LENGTH: usize = 8 * 1024;

const MAX_HEADERS: usize = 64;
const CHUNK_SIZE: usize = 1024;

/// Parsed request line and headers of the request that initiated the upgrade.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
}

/// Reads the request head off `stream`. Returns the parsed head together with any bytes that
/// arrived after the blank line terminating it.
pub fn read_request_head<S: Read>(stream: &mut S, max_length: usize) -> Result<(RequestHead, Vec<u8>), Error> {
    let finder = Finder::new(b"\r\n\r\n");
    let mut buffer = ReadBuffer::<CHUNK_SIZE>::new();
    let head_length = loop {
        buffer.read_from(stream)?;
        if let Some(position) = finder.find(buffer.view(), b"\r\n\r\n") {
            break position + 4;
        }
        if buffer.available() > max_length {
            return Err(Error::UpgradeUnsupported(format!(
                "request head exceeds {max_length} bytes"
            )));
        }
    };
    if head_length > max_length {
        return Err(Error::UpgradeUnsupported(format!("request head exceeds {max_length} bytes")));
    }

    let head = parse_request_head(&buffer.view()[..head_length])?;
    buffer.consume(head_length);
    Ok((head, buffer.drain()))
}

fn parse_request_head(bytes: &[u8]) -> Result<RequestHead, Error> {
    let mut headers = [EMPTY_HEADER; MAX_HEADERS];
    let mut request = Request::new(&mut headers);
    match request.parse(bytes) {
        Ok(Status::Complete(_)) => {}
        Ok(Status::Partial) => return Err(Error::UpgradeUnsupported("incomplete request head".to_owned())),
        Err(err) => return Err(Error::UpgradeUnsupported(format!("malformed request head: {err}"))),
    }

    let method = request
        .method
        .and_then(|method| Method::from_bytes(method.as_bytes()).ok())
        .ok_or_else(|| Error::UpgradeUnsupported("invalid request method".to_owned()))?;
    let path = request.path.unwrap_or("/").to_owned();

    let mut header_map = HeaderMap::with_capacity(request.headers.len());
    for header in request.headers.iter() {
        let name = HeaderName::from_bytes(header.name.as_bytes())
            .map_err(|err| Error::UpgradeUnsupported(format!("invalid header name: {err}")))?;
        let value = HeaderValue::from_bytes(header.value)
            .map_err(|err| Error::UpgradeUnsupported(format!("invalid header value: {err}")))?;
        header_map.append(name, value);
    }

    Ok(RequestHead {
        method,
        path,
        headers: header_map,
    })
}

/// Writes a body-less response with the given status and flushes it.
pub fn write_status_response<S: Write>(stream: &mut S, status: StatusCode) -> io::Result<()> {
    let reason = status.canonical_reason().unwrap_or("");
    stream.write_all(format!("HTTP/1.1 {} {}\r\n", status.as_u16(), reason).as_bytes())?;
    stream.write_all(b"Connection: close\r\n")?;
    stream.write_all(b"Content-Length: 0\r\n")?;
    stream.write_all(b"\r\n")?;
    stream.flush()
}
