use std::io::{ErrorKind, Write};
use std::time::Duration;

use bytes::BytesMut;
use tracing::trace;

use crate::codec::{encode_frame, FrameConfig};
use crate::error::{FrameError, Result};
use crate::message::{BusMessage, MESSAGE_WIRE_SIZE};

/// Writes complete frames to any `Write` stream, one byte at a time.
///
/// Every byte is followed by a flush and `config.byte_delay` of idle time so
/// the slaves' receive loops keep up at 9600 baud. A failed write or flush
/// is returned as-is; nothing is retried.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(MESSAGE_WIRE_SIZE),
            config,
        }
    }

    /// Encode and write a bus state message.
    pub fn write_message(&mut self, message: &BusMessage) -> Result<()> {
        self.send(&message.payload())
    }

    /// Encode and write an arbitrary payload.
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.buf.clear();
        encode_frame(payload, &mut self.buf);
        trace!(frame = ?self.buf.as_ref(), "writing frame");
        write_paced(&mut self.inner, &self.buf, self.config.byte_delay)
    }

    /// Write raw bytes with the same pacing as frames (no framing added).
    pub fn send_raw(&mut self, bytes: &[u8]) -> Result<()> {
        write_paced(&mut self.inner, bytes, self.config.byte_delay)
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        flush_stream(&mut self.inner)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

fn write_paced<T: Write>(inner: &mut T, bytes: &[u8], byte_delay: Duration) -> Result<()> {
    for &byte in bytes {
        write_byte(inner, byte)?;
        flush_stream(inner)?;
        if !byte_delay.is_zero() {
            std::thread::sleep(byte_delay);
        }
    }
    Ok(())
}

fn write_byte<T: Write>(inner: &mut T, byte: u8) -> Result<()> {
    loop {
        match inner.write(&[byte]) {
            Ok(0) => return Err(FrameError::ConnectionClosed),
            Ok(_) => return Ok(()),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
}

fn flush_stream<T: Write>(inner: &mut T) -> Result<()> {
    loop {
        match inner.flush() {
            Ok(()) => return Ok(()),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::codec::{compute_checksum, START_BYTE};

    fn unpaced<T: Write>(inner: T) -> FrameWriter<T> {
        FrameWriter::with_config(inner, FrameConfig::unpaced())
    }

    #[test]
    fn write_single_message() {
        let mut writer = unpaced(Cursor::new(Vec::<u8>::new()));
        writer
            .write_message(&BusMessage::new(2, [0, 0, 10, 0], 99))
            .unwrap();

        let wire = writer.into_inner().into_inner();
        assert_eq!(
            wire,
            vec![START_BYTE, 2, 0, 0, 10, 0, 99, compute_checksum(&[2, 0, 0, 10, 0, 99])]
        );
    }

    #[test]
    fn write_multiple_messages() {
        let mut writer = unpaced(Cursor::new(Vec::<u8>::new()));
        writer.write_message(&BusMessage::new(1, [1; 4], 1)).unwrap();
        writer.write_message(&BusMessage::new(2, [2; 4], 2)).unwrap();

        let wire = writer.into_inner().into_inner();
        assert_eq!(wire.len(), 2 * MESSAGE_WIRE_SIZE);
        assert_eq!(wire[0], START_BYTE);
        assert_eq!(wire[MESSAGE_WIRE_SIZE], START_BYTE);
        assert_eq!(wire[MESSAGE_WIRE_SIZE + 1], 2);
    }

    #[test]
    fn every_byte_is_written_alone_and_flushed() {
        let mut writer = unpaced(RecordingWriter::default());
        writer.send(&[1, 2, 3]).unwrap();

        let ops = writer.into_inner().ops;
        assert_eq!(
            ops,
            vec![
                Op::Write(vec![START_BYTE]),
                Op::Flush,
                Op::Write(vec![1]),
                Op::Flush,
                Op::Write(vec![2]),
                Op::Flush,
                Op::Write(vec![3]),
                Op::Flush,
                Op::Write(vec![compute_checksum(&[1, 2, 3])]),
                Op::Flush,
            ]
        );
    }

    #[test]
    fn pacing_delays_each_byte() {
        let cfg = FrameConfig {
            byte_delay: Duration::from_millis(2),
            ..FrameConfig::default()
        };
        let mut writer = FrameWriter::with_config(Cursor::new(Vec::<u8>::new()), cfg);

        let started = std::time::Instant::now();
        writer.send(&[1, 2]).unwrap();
        assert!(started.elapsed() >= Duration::from_millis(8));
    }

    #[test]
    fn write_failure_is_not_retried() {
        let mut writer = unpaced(FailingWriter { writes: 0 });
        let err = writer.send(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, FrameError::Io(ref io) if io.kind() == ErrorKind::BrokenPipe));
        assert_eq!(writer.get_ref().writes, 1);
    }

    #[test]
    fn timed_out_write_is_an_error() {
        let mut writer = unpaced(TimeoutWriter);
        let err = writer.send(&[1]).unwrap_err();
        assert!(matches!(err, FrameError::Io(ref io) if io.kind() == ErrorKind::TimedOut));
    }

    #[test]
    fn handles_interrupted_write_and_flush() {
        let writer_impl = InterruptedWriteThenFlush {
            wrote_once: false,
            flush_interrupted: false,
            data: Vec::new(),
        };

        let mut writer = unpaced(writer_impl);
        writer.send(b"retry").unwrap();

        let inner = writer.into_inner();
        assert_eq!(inner.data.len(), 7);
    }

    #[test]
    fn connection_closed_when_write_returns_zero() {
        let mut writer = unpaced(ZeroWriter);
        let err = writer.send(b"x").unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn send_raw_adds_no_framing() {
        let mut writer = unpaced(Cursor::new(Vec::<u8>::new()));
        writer.send_raw(b"dump\n").unwrap();
        assert_eq!(writer.into_inner().into_inner(), b"dump\n".to_vec());
    }

    #[test]
    fn written_bytes_decode() {
        let mut writer = unpaced(Cursor::new(Vec::<u8>::new()));
        let msg = BusMessage::new(7, [64, 0, 0, 1], 3);
        writer.write_message(&msg).unwrap();

        let wire = writer.into_inner().into_inner();
        let mut reader = crate::reader::FrameReader::new(Cursor::new(wire));
        assert_eq!(reader.read_message().unwrap(), msg);
    }

    #[derive(Debug, PartialEq)]
    enum Op {
        Write(Vec<u8>),
        Flush,
    }

    #[derive(Default)]
    struct RecordingWriter {
        ops: Vec<Op>,
    }

    impl Write for RecordingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.ops.push(Op::Write(buf.to_vec()));
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.ops.push(Op::Flush);
            Ok(())
        }
    }

    struct FailingWriter {
        writes: usize,
    }

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            self.writes += 1;
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct TimeoutWriter;

    impl Write for TimeoutWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::TimedOut))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct InterruptedWriteThenFlush {
        wrote_once: bool,
        flush_interrupted: bool,
        data: Vec<u8>,
    }

    impl Write for InterruptedWriteThenFlush {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.wrote_once {
                self.wrote_once = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            if !self.flush_interrupted {
                self.flush_interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
