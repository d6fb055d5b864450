pub mod buffer;
pub mod config;
pub mod http;
pub mod server;
pub mod stream;
pub mod ws;
