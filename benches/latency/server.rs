use std::net::{SocketAddr, TcpListener};
use std::thread;

use hijackws::config::ServerConfig;
use hijackws::server::Server;
use hijackws::ws::handler::Echo;
use tungstenite::accept;

pub fn start_hijackws_on_thread() -> SocketAddr {
    let config = ServerConfig::default().with_addr("127.0.0.1:0".parse().unwrap());
    let server = Server::bind(config, Echo).unwrap();
    let addr = server.local_addr().unwrap();
    thread::spawn(move || server.run());
    addr
}

pub fn start_tungstenite_on_thread() -> SocketAddr {
    let server = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = server.local_addr().unwrap();
    thread::spawn(move || {
        if let Some(stream) = server.incoming().next() {
            let mut client = accept(stream.unwrap()).unwrap();
            while let Ok(msg) = client.read() {
                if client.send(msg).is_err() {
                    break;
                }
            }
        }
    });
    addr
}
