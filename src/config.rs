use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use crate::http::DEFAULT_MAX_REQUEST_HEAD_LENGTH;
use crate::ws::decoder::DEFAULT_MAX_PAYLOAD_LENGTH;
use crate::ws::protocol::status;

/// Port the server listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 8000;

/// Server wide settings, applied to every accepted connection.
///
/// ```
/// use std::time::Duration;
/// use hijackws::config::ServerConfig;
///
/// let config = ServerConfig::default()
///     .with_addr("127.0.0.1:9001".parse().unwrap())
///     .with_read_timeout(Duration::from_secs(30));
/// assert_eq!(1000, config.close_status_code);
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Status code sent in close frames this side initiates.
    pub close_status_code: u16,
    pub max_payload_len: u64,
    /// Treat unmasked client frames as protocol violations.
    pub require_masked_frames: bool,
    /// No timeout means a stalled peer blocks its worker indefinitely.
    pub read_timeout: Option<Duration>,
    pub max_request_head_len: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            close_status_code: status::NORMAL_CLOSURE,
            max_payload_len: DEFAULT_MAX_PAYLOAD_LENGTH,
            require_masked_frames: true,
            read_timeout: None,
            max_request_head_len: DEFAULT_MAX_REQUEST_HEAD_LENGTH,
        }
    }
}

impl ServerConfig {
    pub fn with_addr(self, addr: SocketAddr) -> Self {
        Self { addr, ..self }
    }

    pub fn with_close_status_code(self, close_status_code: u16) -> Self {
        Self {
            close_status_code,
            ..self
        }
    }

    pub fn with_max_payload_len(self, max_payload_len: u64) -> Self {
        Self {
            max_payload_len,
            ..self
        }
    }

    pub fn with_require_masked_frames(self, require_masked_frames: bool) -> Self {
        Self {
            require_masked_frames,
            ..self
        }
    }

    pub fn with_read_timeout(self, read_timeout: Duration) -> Self {
        Self {
            read_timeout: Some(read_timeout),
            ..self
        }
    }

    pub fn with_max_request_head_len(self, max_request_head_len: usize) -> Self {
        Self {
            max_request_head_len,
            ..self
        }
    }
}
