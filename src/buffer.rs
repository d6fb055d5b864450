use std::io;
use std::io::ErrorKind::UnexpectedEof;
use std::io::Read;

const DEFAULT_INITIAL_CAPACITY: usize = 4096;

/// Growable buffer filled from a blocking stream in chunks of at most `CHUNK_SIZE` bytes. Data
/// between `head` and `tail` is available for consumption.
#[derive(Debug)]
pub struct ReadBuffer<const CHUNK_SIZE: usize, const INITIAL_CAPACITY: usize = DEFAULT_INITIAL_CAPACITY> {
    inner: Vec<u8>,
    head: usize,
    tail: usize,
}

impl<const CHUNK_SIZE: usize, const INITIAL_CAPACITY: usize> Default for ReadBuffer<CHUNK_SIZE, INITIAL_CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const CHUNK_SIZE: usize, const INITIAL_CAPACITY: usize> ReadBuffer<CHUNK_SIZE, INITIAL_CAPACITY> {
    pub fn new() -> ReadBuffer<CHUNK_SIZE, INITIAL_CAPACITY> {
        assert!(CHUNK_SIZE > 0, "CHUNK_SIZE must be greater than zero");
        Self {
            inner: vec![0u8; INITIAL_CAPACITY.max(CHUNK_SIZE)],
            head: 0,
            tail: 0,
        }
    }

    #[inline]
    pub const fn available(&self) -> usize {
        self.tail - self.head
    }

    /// Performs a single read from the stream, returning the number of bytes appended. A stream
    /// that has reached its end is reported as [`UnexpectedEof`].
    pub fn read_from<S: Read>(&mut self, stream: &mut S) -> io::Result<usize> {
        #[cold]
        fn grow(buf: &mut Vec<u8>) {
            buf.resize(buf.len() * 2, 0u8);
        }

        // compact
        if self.head > 0 && self.available() > 0 {
            self.inner.copy_within(self.head..self.tail, 0);
            self.tail -= self.head;
            self.head = 0;
        }

        // clear
        if self.head > 0 && self.available() == 0 {
            self.head = 0;
            self.tail = 0;
        }

        // ensure capacity
        while self.tail + CHUNK_SIZE > self.inner.len() {
            grow(&mut self.inner);
        }

        let read = stream.read(&mut self.inner[self.tail..self.tail + CHUNK_SIZE])?;
        if read == 0 {
            return Err(io::Error::new(UnexpectedEof, "stream closed"));
        }
        self.tail += read;
        Ok(read)
    }

    #[inline]
    pub fn view(&self) -> &[u8] {
        &self.inner[self.head..self.tail]
    }

    #[inline]
    pub fn consume(&mut self, len: usize) {
        #[cold]
        fn bounds_violation(head: usize, tail: usize) -> ! {
            panic!("bounds violation:  head[{}] > tail[{}]", head, tail)
        }

        self.head += len;

        if self.head > self.tail {
            bounds_violation(self.head, self.tail);
        }
    }

    /// Takes whatever is left in the buffer, leaving it empty.
    pub fn drain(&mut self) -> Vec<u8> {
        let leftover = self.view().to_vec();
        self.head = 0;
        self.tail = 0;
        leftover
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn should_read_from_stream() {
        let mut buf = ReadBuffer::<16>::new();
        assert_eq!(DEFAULT_INITIAL_CAPACITY, buf.inner.len());
        assert_eq!(0, buf.head);
        assert_eq!(0, buf.tail);

        let mut stream = Cursor::new(b"hello world!");
        assert_eq!(12, buf.read_from(&mut stream).expect("unable to read from the stream"));

        assert_eq!(12, buf.available());
        assert_eq!(b"hello world!", buf.view());

        buf.consume(6);
        assert_eq!(6, buf.available());
        assert_eq!(b"world!", buf.view());
    }

    #[test]
    fn should_append_on_multiple_read() {
        let mut buf = ReadBuffer::<6>::new();
        let mut stream = Cursor::new(b"hello world!");

        buf.read_from(&mut stream).expect("unable to read from the stream");
        assert_eq!(b"hello ", buf.view());

        buf.read_from(&mut stream).expect("unable to read from the stream");
        assert_eq!(b"hello world!", buf.view());

        assert_eq!(DEFAULT_INITIAL_CAPACITY, buf.inner.len());
    }

    #[test]
    fn should_compact_if_any_leftover_before_next_read() {
        let mut buf = ReadBuffer::<6>::new();
        let mut stream = Cursor::new(b"hello world you are amazing!");

        buf.read_from(&mut stream).expect("unable to read from the stream");
        assert_eq!(b"hello ", buf.view());

        buf.consume(2);
        assert_eq!(4, buf.available());
        assert_eq!(b"llo ", buf.view());

        buf.read_from(&mut stream).expect("unable to read from the stream");
        assert_eq!(10, buf.available());
        assert_eq!(b"llo world ", buf.view());
        assert_eq!(0, buf.head);
        assert_eq!(10, buf.tail);
    }

    #[test]
    fn should_grow_when_appending() {
        let mut buf = ReadBuffer::<1, 8>::new();
        assert_eq!(8, buf.inner.len());
        let mut stream = Cursor::new(b"hello world!");
        while stream.position() < 12 {
            buf.read_from(&mut stream).expect("unable to read from the stream");
        }
        assert_eq!(b"hello world!", buf.view());
        assert_eq!(16, buf.inner.len());
    }

    #[test]
    fn should_report_end_of_stream() {
        let mut buf = ReadBuffer::<6>::new();
        let mut stream = Cursor::new(b"");
        let err = buf.read_from(&mut stream).unwrap_err();
        assert_eq!(UnexpectedEof, err.kind());
    }

    #[test]
    fn should_drain_leftover() {
        let mut buf = ReadBuffer::<16>::new();
        let mut stream = Cursor::new(b"head\r\n\r\nbody");
        buf.read_from(&mut stream).unwrap();
        buf.consume(8);
        assert_eq!(b"body".to_vec(), buf.drain());
        assert_eq!(0, buf.available());
    }

    #[test]
    #[should_panic(expected = "bounds violation:  head[32] > tail[6]")]
    fn should_panic_if_bounds_violated_on_consume() {
        let mut buf = ReadBuffer::<6>::new();
        let mut stream = Cursor::new(b"hello world!");

        buf.read_from(&mut stream).expect("unable to read from the stream");
        buf.consume(32); // will panic
    }
}
