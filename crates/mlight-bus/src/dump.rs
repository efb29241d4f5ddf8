use std::convert::Infallible;
use std::io::Write;
use std::time::Duration;

use mlight_frame::FrameWriter;
use tracing::info;

use crate::error::Result;
use crate::table::BrightnessTable;

/// Diagnostic stand-in for the transmitter.
///
/// Writes a readable rendering of the table to the bus every interval, so
/// the wiring can be checked with a terminal on the other end.
pub struct StateDumper<W> {
    writer: FrameWriter<W>,
    table: BrightnessTable,
    interval: Duration,
}

impl<W: Write> StateDumper<W> {
    pub fn new(writer: FrameWriter<W>, table: BrightnessTable, interval: Duration) -> Self {
        Self {
            writer,
            table,
            interval,
        }
    }

    /// Write one dump.
    pub fn dump(&mut self) -> Result<()> {
        let text = render(&self.table);
        self.writer.send_raw(text.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }

    /// Dump forever until the bus fails.
    pub fn run(mut self) -> Result<Infallible> {
        info!("running state dump variant instead of transmitter");
        loop {
            self.dump()?;
            std::thread::sleep(self.interval);
        }
    }

    /// Consume the dumper and return its writer.
    pub fn into_writer(self) -> FrameWriter<W> {
        self.writer
    }
}

fn render(table: &BrightnessTable) -> String {
    let body = table
        .levels()
        .iter()
        .map(|(address, channels)| format!("{address}: {channels:?}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{body}}}\n\n")
}
