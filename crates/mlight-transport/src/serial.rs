use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::BusStream;

/// Baud rate the slave firmware listens on.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Serial device settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyUSB0`.
    pub path: PathBuf,
    /// Line speed. Default: 9600.
    pub baud_rate: u32,
    /// How long a read waits for bytes before returning `TimedOut`. Default: 100 ms.
    pub read_timeout: Duration,
    /// How long a write waits for a busy line. Default: `None`, no deadline.
    pub write_timeout: Option<Duration>,
}

impl SerialConfig {
    /// Settings for `path` with default line parameters.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: Duration::from_millis(100),
            write_timeout: None,
        }
    }

    /// Override the baud rate.
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self::new("/dev/ttyUSB0")
    }
}

/// Open the serial device described by `config` (8N1, no flow control).
pub fn open(config: &SerialConfig) -> Result<BusStream> {
    let path_str = config.path.to_string_lossy();
    debug!(path = %path_str, baud = config.baud_rate, "opening serial device");

    let port = serialport::new(path_str.as_ref(), config.baud_rate)
        .data_bits(serialport::DataBits::Eight)
        .parity(serialport::Parity::None)
        .stop_bits(serialport::StopBits::One)
        .flow_control(serialport::FlowControl::None)
        .timeout(config.read_timeout)
        .open()
        .map_err(|source| TransportError::Open {
            path: config.path.clone(),
            source,
        })?;

    info!(path = %path_str, baud = config.baud_rate, "serial bus opened");
    Ok(BusStream::from_serial(port, config.write_timeout))
}
