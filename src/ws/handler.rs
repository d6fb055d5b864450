use std::io::{Read, Write};

use crate::ws::{Error, Frame, Websocket};

/// Application side of a connection. Receives every text, binary and continuation frame and
/// decides what, if anything, to send back through the same websocket.
pub trait Handler<S> {
    fn on_frame(&mut self, ws: &mut Websocket<S>, frame: Frame) -> Result<(), Error>;
}

impl<S, F> Handler<S> for F
where
    F: FnMut(&mut Websocket<S>, Frame) -> Result<(), Error>,
{
    fn on_frame(&mut self, ws: &mut Websocket<S>, frame: Frame) -> Result<(), Error> {
        self(ws, frame)
    }
}

/// Sends every frame back verbatim. Incoming masking keys are dropped since server frames are
/// never masked.
#[derive(Debug, Default, Copy, Clone)]
pub struct Echo;

impl<S: Read + Write> Handler<S> for Echo {
    fn on_frame(&mut self, ws: &mut Websocket<S>, frame: Frame) -> Result<(), Error> {
        ws.send(&Frame { mask: None, ..frame })
    }
}
