use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};
use mlight_transport::BusStream;

use crate::codec::{decode_frame, FrameConfig};
use crate::error::{FrameError, Result};
use crate::message::BusMessage;

const INITIAL_BUFFER_CAPACITY: usize = 256;
const READ_CHUNK_SIZE: usize = 64;

/// Reads complete frames from any `Read` stream.
///
/// Handles partial reads and resynchronises on the start byte internally.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Read the next complete payload (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached and
    /// `Err(FrameError::ChecksumMismatch)` for a corrupt frame; the reader
    /// stays usable after the latter.
    pub fn read_payload(&mut self) -> Result<Bytes> {
        loop {
            if let Some(payload) = decode_frame(&mut self.buf, self.config.payload_len)? {
                return Ok(payload);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Read the next bus state message (blocking).
    pub fn read_message(&mut self) -> Result<BusMessage> {
        let payload = self.read_payload()?;
        BusMessage::from_payload(&payload)
    }
}

impl FrameReader<BusStream> {
    /// Create a frame reader for an open bus.
    pub fn for_bus(inner: BusStream, config: FrameConfig) -> Self {
        Self::with_config(inner, config)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::codec::encode;

    #[test]
    fn read_single_message() {
        let msg = BusMessage::new(4, [0, 30, 0, 40], 17);
        let mut reader = FrameReader::new(Cursor::new(msg.encode().to_vec()));
        assert_eq!(reader.read_message().unwrap(), msg);
    }

    #[test]
    fn read_back_to_back_messages() {
        let first = BusMessage::new(1, [1, 2, 3, 4], 5);
        let second = BusMessage::new(2, [0; 4], 6);
        let mut wire = first.encode().to_vec();
        wire.extend_from_slice(&second.encode());

        let mut reader = FrameReader::new(Cursor::new(wire));
        assert_eq!(reader.read_message().unwrap(), first);
        assert_eq!(reader.read_message().unwrap(), second);
        assert!(matches!(
            reader.read_message(),
            Err(FrameError::ConnectionClosed)
        ));
    }

    #[test]
    fn reader_recovers_after_corrupt_frame() {
        let good = BusMessage::new(9, [64; 4], 1);
        let mut wire = BusMessage::new(8, [1; 4], 2).encode().to_vec();
        wire[7] = wire[7].wrapping_add(1);
        wire.extend_from_slice(&good.encode());

        let mut reader = FrameReader::new(Cursor::new(wire));
        assert!(matches!(
            reader.read_message(),
            Err(FrameError::ChecksumMismatch { .. })
        ));
        assert_eq!(reader.read_message().unwrap(), good);
    }

    #[test]
    fn read_with_chunked_source() {
        let msg = BusMessage::new(3, [5, 6, 7, 8], 9);
        let reader_impl = OneByteReader {
            data: msg.encode().to_vec(),
            pos: 0,
        };
        let mut reader = FrameReader::new(reader_impl);
        assert_eq!(reader.read_message().unwrap(), msg);
    }

    #[test]
    fn custom_payload_length() {
        let cfg = FrameConfig {
            payload_len: 2,
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::with_config(Cursor::new(encode(&[1, 2]).to_vec()), cfg);
        assert_eq!(reader.read_payload().unwrap().as_ref(), &[1, 2]);
    }

    struct OneByteReader {
        data: Vec<u8>,
        pos: usize,
    }

    impl Read for OneByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.data.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.data[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }
}
