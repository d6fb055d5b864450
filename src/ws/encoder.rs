use std::io;
use std::io::Write;

use crate::ws::protocol::{self, EXTENDED_PAYLOAD_LENGTH_2, EXTENDED_PAYLOAD_LENGTH_8};
use crate::ws::{Frame, mask};

/// Serialises `frame` into its wire representation. If the frame carries a masking key the
/// payload is masked on the way out.
pub fn encode(frame: &Frame) -> Vec<u8> {
    let payload_length = frame.payload_length();
    let length_indicator = protocol::length_indicator_for(payload_length);
    let header_length = 2 + protocol::extended_length_size(length_indicator) + if frame.masked() { 4 } else { 0 };

    let mut bytes = Vec::with_capacity(header_length + frame.payload.len());
    bytes.push(protocol::pack_first(frame.fin, frame.rsv, frame.opcode));
    bytes.push(protocol::pack_second(frame.masked(), length_indicator));
    match length_indicator {
        EXTENDED_PAYLOAD_LENGTH_2 => bytes.extend_from_slice(&(payload_length as u16).to_be_bytes()),
        EXTENDED_PAYLOAD_LENGTH_8 => bytes.extend_from_slice(&payload_length.to_be_bytes()),
        _ => {}
    }
    match frame.mask {
        Some(key) => {
            bytes.extend_from_slice(&key);
            let offset = bytes.len();
            bytes.extend_from_slice(&frame.payload);
            mask::apply(&mut bytes[offset..], key);
        }
        None => bytes.extend_from_slice(&frame.payload),
    }
    bytes
}

/// Writes `frame` to the stream and flushes it.
pub(crate) fn send<S: Write>(stream: &mut S, frame: &Frame) -> io::Result<()> {
    stream.write_all(&encode(frame))?;
    stream.flush()
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::ws::decoder::Decoder;
    use crate::ws::protocol::Opcode;

    fn header_of(payload_length: usize) -> Vec<u8> {
        let bytes = encode(&Frame::binary(vec![0u8; payload_length]));
        bytes[..bytes.len() - payload_length].to_vec()
    }

    #[test]
    fn should_encode_rfc_unmasked_text_frame() {
        assert_eq!(vec![0x81, 0x05, 0x48, 0x65, 0x6c, 0x6c, 0x6f], encode(&Frame::text("Hello")));
    }

    #[test]
    fn should_encode_rfc_masked_text_frame() {
        let frame = Frame::text("Hello").with_mask([0x37, 0xfa, 0x21, 0x3d]);
        assert_eq!(
            vec![0x81, 0x85, 0x37, 0xfa, 0x21, 0x3d, 0x7f, 0x9f, 0x4d, 0x51, 0x58],
            encode(&frame)
        );
        // the frame itself keeps the plain payload
        assert_eq!(b"Hello", frame.payload.as_slice());
    }

    #[test]
    fn should_use_shortest_length_form_at_boundaries() {
        assert_eq!(vec![0x82, 125], header_of(125));
        assert_eq!(vec![0x82, 126, 0x00, 0x7e], header_of(126));
        assert_eq!(vec![0x82, 126, 0xff, 0xff], header_of(65535));
        assert_eq!(vec![0x82, 127, 0, 0, 0, 0, 0, 1, 0, 0], header_of(65536));
    }

    #[test]
    fn should_encode_empty_payload() {
        assert_eq!(vec![0x89, 0x00], encode(&Frame::ping(Vec::new())));
    }

    #[test]
    fn should_encode_close_frame_with_status_code() {
        assert_eq!(vec![0x88, 0x02, 0x03, 0xe8], encode(&Frame::close(1000)));
    }

    #[test]
    fn should_decode_what_was_encoded() {
        let op_codes = [
            Opcode::Continuation,
            Opcode::Text,
            Opcode::Binary,
            Opcode::ConnectionClose,
            Opcode::Ping,
            Opcode::Pong,
        ];
        for op_code in op_codes {
            for payload_length in [0, 1, 125, 126, 65535, 65536] {
                for fin in [true, false] {
                    let frame = Frame::new(fin, op_code, vec![0x5a; payload_length]).with_rsv([fin, !fin, true]);
                    let decoded = Decoder::new().decode(&mut Cursor::new(encode(&frame))).unwrap();
                    assert_eq!(frame, decoded);

                    let masked = frame.with_random_mask();
                    let decoded = Decoder::new().decode(&mut Cursor::new(encode(&masked))).unwrap();
                    assert_eq!(masked, decoded);
                }
            }
        }
    }

    #[test]
    fn should_flush_after_send() {
        struct FlushTracking {
            written: Vec<u8>,
            flushed: usize,
        }

        impl Write for FlushTracking {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.written.extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                self.flushed += 1;
                Ok(())
            }
        }

        let mut stream = FlushTracking {
            written: Vec::new(),
            flushed: 0,
        };
        send(&mut stream, &Frame::pong("abc")).unwrap();
        assert_eq!(vec![0x8a, 0x03, b'a', b'b', b'c'], stream.written);
        assert_eq!(1, stream.flushed);
    }
}
