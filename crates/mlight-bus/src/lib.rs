//! Brightness state and the bus transmitter.
//!
//! The [`BrightnessTable`] holds the desired level of every channel of every
//! active slave. A background [`Transmitter`] re-broadcasts that table over
//! the serial bus forever, one framed message per address per cycle, and
//! drops addresses once their all-off state has been sent.
//!
//! The table is shared with whoever applies control messages. Readers take
//! a snapshot under a short lock; the serial I/O never runs under it, so a
//! `set` racing a cycle is picked up on the next one at the latest.

pub mod config;
pub mod dump;
pub mod error;
pub mod nonce;
pub mod table;
pub mod transmitter;

use std::convert::Infallible;
use std::io::Write;
use std::thread::JoinHandle;

use mlight_frame::{FrameConfig, FrameWriter};
use tracing::info;

pub use config::BusConfig;
pub use dump::StateDumper;
pub use error::{BusError, Result};
pub use mlight_frame::CHANNEL_COUNT;
pub use nonce::{entropy_source, seeded_source, NonceSource};
pub use table::{
    clamp_brightness, BrightnessTable, ChannelValues, Channels, Entry, Phase, DEFAULT_BRIGHTNESS,
    MAX_BRIGHTNESS,
};
pub use transmitter::{CycleReport, Transmitter};

/// A running bus: the shared table plus the thread broadcasting it.
pub struct BusHandle {
    table: BrightnessTable,
    thread: JoinHandle<Result<Infallible>>,
}

impl BusHandle {
    /// The table the background thread broadcasts.
    pub fn table(&self) -> &BrightnessTable {
        &self.table
    }

    /// True once the background thread has stopped (which only happens on error).
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Block until the background thread dies and return why.
    pub fn join(self) -> BusError {
        match self.thread.join() {
            Ok(Err(err)) => err,
            Ok(Ok(never)) => match never {},
            Err(_) => BusError::Panicked,
        }
    }
}

/// Start broadcasting a fresh table on `stream` with an entropy-seeded nonce source.
pub fn spawn<W>(stream: W, config: &BusConfig) -> Result<BusHandle>
where
    W: Write + Send + 'static,
{
    spawn_with(stream, entropy_source(), config)
}

/// Start broadcasting a fresh table on `stream` with an explicit nonce source.
pub fn spawn_with<W, N>(stream: W, nonces: N, config: &BusConfig) -> Result<BusHandle>
where
    W: Write + Send + 'static,
    N: NonceSource + 'static,
{
    let table = BrightnessTable::new(config.default_brightness);
    let transmitter = Transmitter::new(
        frame_writer(stream, config),
        table.clone(),
        nonces,
        config.send_interval,
    );

    let thread = std::thread::Builder::new()
        .name("mlight-transmitter".into())
        .spawn(move || transmitter.run())
        .map_err(BusError::Spawn)?;

    info!(
        interval_ms = config.send_interval.as_millis() as u64,
        default_brightness = config.default_brightness,
        "bus transmitter started"
    );
    Ok(BusHandle { table, thread })
}

/// Start the diagnostic dumper instead of the transmitter.
///
/// The stream receives a readable rendering of the table every
/// `config.dump_interval` rather than frames.
pub fn spawn_dumper<W>(stream: W, config: &BusConfig) -> Result<BusHandle>
where
    W: Write + Send + 'static,
{
    let table = BrightnessTable::new(config.default_brightness);
    let dumper = StateDumper::new(
        frame_writer(stream, config),
        table.clone(),
        config.dump_interval,
    );

    let thread = std::thread::Builder::new()
        .name("mlight-dumper".into())
        .spawn(move || dumper.run())
        .map_err(BusError::Spawn)?;

    info!(
        interval_ms = config.dump_interval.as_millis() as u64,
        "bus state dumper started"
    );
    Ok(BusHandle { table, thread })
}

fn frame_writer<W: Write>(stream: W, config: &BusConfig) -> FrameWriter<W> {
    FrameWriter::with_config(
        stream,
        FrameConfig {
            byte_delay: config.byte_delay,
            ..FrameConfig::default()
        },
    )
}
