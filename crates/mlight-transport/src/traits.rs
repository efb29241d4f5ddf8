use std::io::{self, ErrorKind, Read, Write};
use std::time::{Duration, Instant};

use tracing::trace;

/// An open bus connection. Implements Read + Write.
///
/// The framing layer only ever writes to it; reads are used by the sniffer.
/// Reads give up after the port's read timeout. Writes wait for the line
/// for as long as `write_timeout` allows, which by default is forever.
pub struct BusStream {
    inner: BusStreamInner,
    write_timeout: Option<Duration>,
}

enum BusStreamInner {
    Serial(Box<dyn serialport::SerialPort>),
}

impl Read for BusStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.inner {
            BusStreamInner::Serial(port) => port.read(buf),
        }
    }
}

impl Write for BusStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.inner {
            BusStreamInner::Serial(port) => write_waiting(port, buf, self.write_timeout),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.inner {
            BusStreamInner::Serial(port) => port.flush(),
        }
    }
}

impl BusStream {
    pub(crate) fn from_serial(
        port: Box<dyn serialport::SerialPort>,
        write_timeout: Option<Duration>,
    ) -> Self {
        Self {
            inner: BusStreamInner::Serial(port),
            write_timeout,
        }
    }

    /// Device name as reported by the port, if any.
    pub fn name(&self) -> Option<String> {
        match &self.inner {
            BusStreamInner::Serial(port) => port.name(),
        }
    }
}

impl std::fmt::Debug for BusStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            BusStreamInner::Serial(port) => f
                .debug_struct("BusStream")
                .field("type", &"serial")
                .field("name", &port.name())
                .field("write_timeout", &self.write_timeout)
                .finish(),
        }
    }
}

/// Write to a port whose own timeout is only a polling slice.
///
/// `TimedOut` from the port means the line is still busy, not broken, so
/// the write is re-issued until `limit` (if any) has elapsed.
fn write_waiting<W>(port: &mut W, buf: &[u8], limit: Option<Duration>) -> io::Result<usize>
where
    W: Write + ?Sized,
{
    let started = Instant::now();
    loop {
        match port.write(buf) {
            Err(err)
                if err.kind() == ErrorKind::TimedOut
                    && limit.map_or(true, |limit| started.elapsed() < limit) =>
            {
                trace!(
                    waited_ms = started.elapsed().as_millis() as u64,
                    "serial line busy, still waiting"
                );
            }
            other => return other,
        }
    }
}
