use std::collections::HashMap;
use std::convert::Infallible;
use std::io::Write;
use std::time::Duration;

use mlight_frame::{BusMessage, FrameWriter};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, trace};

use crate::error::Result;
use crate::nonce::NonceSource;
use crate::table::{BrightnessTable, Channels, Phase};

/// What went out on the bus for one address in the previous cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SentState {
    channels: Channels,
    nonce: u8,
}

/// Outcome of one transmit cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Messages written.
    pub sent: usize,
    /// Addresses dropped from the table after their all-off message.
    pub retired: Vec<u8>,
}

/// Re-broadcasts the brightness table over the bus, forever.
///
/// Each cycle sends one message per active address. The nonce byte of an
/// address is redrawn only when its levels differ from what was sent the
/// cycle before, so slaves can tell repeats from fresh commands.
pub struct Transmitter<W, N = ChaCha8Rng> {
    writer: FrameWriter<W>,
    table: BrightnessTable,
    nonces: N,
    sent: HashMap<u8, SentState>,
    send_interval: Duration,
}

impl<W: Write, N: NonceSource> Transmitter<W, N> {
    /// Create a transmitter for `table`.
    pub fn new(
        writer: FrameWriter<W>,
        table: BrightnessTable,
        nonces: N,
        send_interval: Duration,
    ) -> Self {
        Self {
            writer,
            table,
            nonces,
            sent: HashMap::new(),
            send_interval,
        }
    }

    /// Broadcast every active address once, then flush.
    ///
    /// Addresses whose snapshot was all off are retired after their message
    /// is written. The first write or flush error aborts the cycle.
    pub fn run_cycle(&mut self) -> Result<CycleReport> {
        let mut report = CycleReport::default();

        for entry in self.table.snapshot() {
            let nonce = self.nonce_for(entry.address, &entry.channels);
            let message = BusMessage::new(entry.address, entry.channels, nonce);

            trace!(address = entry.address, channels = ?entry.channels, nonce, "sending");
            self.writer.write_message(&message)?;
            self.sent.insert(
                entry.address,
                SentState {
                    channels: entry.channels,
                    nonce,
                },
            );
            report.sent += 1;

            if entry.phase == Phase::PendingRemoval
                && self.table.retire(entry.address, &entry.channels)
            {
                debug!(
                    address = entry.address,
                    "removing address from table, all channels are 0"
                );
                report.retired.push(entry.address);
            }
        }

        self.writer.flush()?;
        Ok(report)
    }

    /// Run cycles separated by the send interval until the bus fails.
    pub fn run(mut self) -> Result<Infallible> {
        info!(
            interval_ms = self.send_interval.as_millis() as u64,
            "transmitter loop running"
        );
        loop {
            self.run_cycle()?;
            std::thread::sleep(self.send_interval);
        }
    }

    /// Nonce byte last sent for `address`.
    pub fn last_nonce(&self, address: u8) -> Option<u8> {
        self.sent.get(&address).map(|sent| sent.nonce)
    }

    /// Levels last sent for `address`.
    pub fn last_sent(&self, address: u8) -> Option<Channels> {
        self.sent.get(&address).map(|sent| sent.channels)
    }

    /// Consume the transmitter and return its writer.
    pub fn into_writer(self) -> FrameWriter<W> {
        self.writer
    }

    fn nonce_for(&mut self, address: u8, channels: &Channels) -> u8 {
        match self.sent.get(&address) {
            Some(previous) if previous.channels == *channels => previous.nonce,
            _ => self.nonces.next_nonce(),
        }
    }
}
