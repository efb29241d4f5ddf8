use std::time::Duration;

use crate::table::DEFAULT_BRIGHTNESS;

/// Timing and defaults for a running bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusConfig {
    /// Pause between transmit cycles. Default: 100 ms.
    pub send_interval: Duration,
    /// Pause after each byte written. Default: 1 ms.
    pub byte_delay: Duration,
    /// Level used when a channel is switched on with no level and no history.
    pub default_brightness: u8,
    /// Pause between state dumps in diagnostic mode. Default: 5 s.
    pub dump_interval: Duration,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            send_interval: Duration::from_millis(100),
            byte_delay: mlight_frame::DEFAULT_BYTE_DELAY,
            default_brightness: DEFAULT_BRIGHTNESS,
            dump_interval: Duration::from_secs(5),
        }
    }
}
