//! Listening socket setup and per-connection socket options.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};

#[cfg(test)]
pub(crate) mod mock;

const DEFAULT_BACKLOG: i32 = 1024;

/// Trait to create a blocking `TcpListener` with socket options applied before binding.
///
/// # Examples
///
/// ```no_run
/// use std::net::TcpListener;
/// use hijackws::stream::BindAndListen;
///
/// let listener = TcpListener::bind_and_listen("0.0.0.0:8000").unwrap();
/// ```
///
/// Use `socket_config` to enable additional socket options.
///
/// ```no_run
/// use std::net::TcpListener;
/// use hijackws::stream::BindAndListen;
///
/// let listener = TcpListener::bind_and_listen_with_socket_config("0.0.0.0:8000", |socket| {
///     socket.set_reuse_port(true)?;
///     Ok(())
/// }).unwrap();
/// ```
pub trait BindAndListen {
    fn bind_and_listen<A>(addr: A) -> io::Result<TcpListener>
    where
        A: ToSocketAddrs,
    {
        Self::bind_and_listen_with_socket_config(addr, |_| Ok(()))
    }

    fn bind_and_listen_with_socket_config<A, F>(addr: A, socket_config: F) -> io::Result<TcpListener>
    where
        A: ToSocketAddrs,
        F: FnOnce(&Socket) -> io::Result<()>;
}

impl BindAndListen for TcpListener {
    fn bind_and_listen_with_socket_config<A, F>(addr: A, socket_config: F) -> io::Result<TcpListener>
    where
        A: ToSocketAddrs,
        F: FnOnce(&Socket) -> io::Result<()>,
    {
        let socket_addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::other("unable to resolve socket address"))?;

        let socket = Socket::new(
            match &socket_addr {
                SocketAddr::V4(_) => Domain::IPV4,
                SocketAddr::V6(_) => Domain::IPV6,
            },
            Type::STREAM,
            Some(Protocol::TCP),
        )?;
        socket.set_nonblocking(false)?;
        socket.set_reuse_address(true)?;

        // apply custom options
        socket_config(&socket)?;

        socket.bind(&socket_addr.into())?;
        socket.listen(DEFAULT_BACKLOG)?;
        Ok(socket.into())
    }
}

/// Options applied to every accepted connection before it is hijacked.
pub fn configure_accepted(stream: &TcpStream, read_timeout: Option<Duration>) -> io::Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_nodelay(true)?;
    stream.set_read_timeout(read_timeout)?;
    Ok(())
}
