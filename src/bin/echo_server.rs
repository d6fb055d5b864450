use std::io;
use std::net::SocketAddr;

use hijackws::config::ServerConfig;
use hijackws::server::Server;
use hijackws::ws::handler::Echo;

fn main() -> io::Result<()> {
    env_logger::init();

    let mut config = ServerConfig::default();
    if let Some(addr) = std::env::args().nth(1) {
        let addr: SocketAddr = addr.parse().map_err(io::Error::other)?;
        config = config.with_addr(addr);
    }

    Server::bind(config, Echo)?.run()
}
