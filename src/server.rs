//! Blocking websocket server handling every connection on its own thread.
//!
//! ## Examples
//!
//! ```no_run
//! use hijackws::config::ServerConfig;
//! use hijackws::server::Server;
//! use hijackws::ws::handler::Echo;
//!
//! let server = Server::bind(ServerConfig::default(), Echo).unwrap();
//! server.run().unwrap();
//! ```

use std::cmp::min;
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::http::hijack::{HijackedStream, TransportAcquirer};
use crate::stream::{BindAndListen, configure_accepted};
use crate::ws::handler::Handler;
use crate::ws::protocol::status;
use crate::ws::{Error, Websocket};

/// Connection type handed to handlers by [`Server`].
pub type TcpWebsocket = Websocket<HijackedStream<TcpStream>>;

pub struct Server<H> {
    listener: TcpListener,
    config: Arc<ServerConfig>,
    handler: H,
}

impl<H> Server<H>
where
    H: Handler<HijackedStream<TcpStream>> + Clone + Send + 'static,
{
    /// Binds the listening socket. Every accepted connection gets its own clone of `handler`.
    pub fn bind(config: ServerConfig, handler: H) -> io::Result<Self> {
        let listener = TcpListener::bind_and_listen(config.addr)?;
        info!("listening on {}", listener.local_addr()?);
        Ok(Self {
            listener,
            config: Arc::new(config),
            handler,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections forever. Errors of individual connections are logged and never affect
    /// other connections. Failed accepts are retried with a growing delay.
    pub fn run(self) -> io::Result<()> {
        let mut backoff = AcceptBackoff::default();
        loop {
            let (stream, peer) = accept_with_backoff(&mut backoff, || self.listener.accept(), thread::sleep);
            let config = self.config.clone();
            let mut handler = self.handler.clone();
            let spawned = thread::Builder::new()
                .name(format!("ws-{peer}"))
                .spawn(move || handle_connection(stream, peer, &config, &mut handler));
            if let Err(err) = spawned {
                error!("unable to spawn worker for connection [{peer}]: {err}");
            }
        }
    }
}

const MIN_ACCEPT_BACKOFF: Duration = Duration::from_millis(5);
const MAX_ACCEPT_BACKOFF: Duration = Duration::from_secs(1);

/// Delay between failed accepts, doubling from 5ms up to 1s and reset by a successful accept.
#[derive(Debug, Default)]
struct AcceptBackoff {
    delay: Option<Duration>,
}

impl AcceptBackoff {
    fn next_delay(&mut self) -> Duration {
        let delay = match self.delay {
            None => MIN_ACCEPT_BACKOFF,
            Some(delay) => min(delay * 2, MAX_ACCEPT_BACKOFF),
        };
        self.delay = Some(delay);
        delay
    }

    fn reset(&mut self) {
        self.delay = None;
    }
}

fn accept_with_backoff<T, A, F>(backoff: &mut AcceptBackoff, mut accept: A, mut sleep: F) -> T
where
    A: FnMut() -> io::Result<T>,
    F: FnMut(Duration),
{
    loop {
        match accept() {
            Ok(accepted) => {
                backoff.reset();
                return accepted;
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => {
                let delay = backoff.next_delay();
                warn!("unable to accept connection, retrying in {delay:?}: {err}");
                sleep(delay);
            }
        }
    }
}

fn handle_connection<H>(stream: TcpStream, peer: SocketAddr, config: &ServerConfig, handler: &mut H)
where
    H: Handler<HijackedStream<TcpStream>>,
{
    info!("accepted connection [{peer}]");
    if let Err(err) = configure_accepted(&stream, config.read_timeout) {
        error!("unable to configure connection [{peer}]: {err}");
        return;
    }
    match serve_connection(stream, config, handler) {
        Ok(()) => info!("connection [{peer}] closed"),
        Err(err) => error!("error when serving connection [{peer}]: {err}"),
    }
}

/// Runs a single connection from hijack to close: acquires the raw stream, performs the
/// handshake and then the frame loop. The stream is released on every exit path.
pub fn serve_connection<T, H>(transport: T, config: &ServerConfig, handler: &mut H) -> Result<(), Error>
where
    T: TransportAcquirer,
    H: Handler<T::Stream>,
{
    let upgrade = transport.acquire_with_limit(config.max_request_head_len)?;
    debug!("upgrading {} {}", upgrade.head.method, upgrade.head.path);

    let mut ws = Websocket::new(upgrade.stream, upgrade.head.headers)
        .with_close_status_code(config.close_status_code)
        .with_max_payload_length(config.max_payload_len)
        .with_require_masked_frames(config.require_masked_frames);
    ws.handshake()?;

    let result = ws.run(handler);
    if result.is_err() && !ws.closed() {
        let _ = ws.close_with(status::INTERNAL_ERROR);
    }
    result
}
