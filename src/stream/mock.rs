//! In-memory duplex stream used by unit tests.

use std::cell::RefCell;
use std::io;
use std::io::{Cursor, Read, Write};
use std::rc::Rc;

use crate::ws::Frame;
use crate::ws::decoder::Decoder;

#[derive(Debug, Default)]
struct Shared {
    input: Cursor<Vec<u8>>,
    output: Vec<u8>,
    released: usize,
}

/// Reads from a fixed input, records everything written and counts how many times it was
/// dropped.
#[derive(Debug)]
pub struct MockStream {
    shared: Rc<RefCell<Shared>>,
}

/// Test side view of a [`MockStream`].
#[derive(Debug, Clone)]
pub struct MockHandle {
    shared: Rc<RefCell<Shared>>,
}

impl MockStream {
    pub fn new(input: Vec<u8>) -> (MockStream, MockHandle) {
        let shared = Rc::new(RefCell::new(Shared {
            input: Cursor::new(input),
            ..Default::default()
        }));
        (MockStream { shared: shared.clone() }, MockHandle { shared })
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.shared.borrow_mut().input.read(buf)
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.shared.borrow_mut().output.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for MockStream {
    fn drop(&mut self) {
        self.shared.borrow_mut().released += 1;
    }
}

impl MockHandle {
    pub fn output(&self) -> Vec<u8> {
        self.shared.borrow().output.clone()
    }

    pub fn clear_output(&self) {
        self.shared.borrow_mut().output.clear();
    }

    /// Number of input bytes read so far.
    pub fn consumed(&self) -> usize {
        self.shared.borrow().input.position() as usize
    }

    pub fn released(&self) -> usize {
        self.shared.borrow().released
    }

    /// Decodes everything written so far as a sequence of frames.
    pub fn written_frames(&self) -> Vec<Frame> {
        let output = self.output();
        let mut cursor = Cursor::new(output.as_slice());
        let decoder = Decoder::new();
        let mut frames = Vec::new();
        while (cursor.position() as usize) < output.len() {
            frames.push(decoder.decode(&mut cursor).expect("invalid frame written"));
        }
        frames
    }
}
