//! MQTT to serial bridge for multi-channel dimmable light controllers.
//!
//! A client publishes the desired on/off state and brightness per slave
//! address and channel; mlight keeps the latest state of every active slave
//! and re-broadcasts it continuously over a framed, checksummed serial bus.
//!
//! # Crate Structure
//!
//! - [`transport`] - Serial device access
//! - [`frame`] - Start-byte framing and checksum, paced writer, reader
//! - [`bus`] - Brightness table and the periodic transmitter
//! - [`command`] - Control topic/payload validation and application

/// Re-export transport types.
pub mod transport {
    pub use mlight_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use mlight_frame::*;
}

/// Re-export bus types.
pub mod bus {
    pub use mlight_bus::*;
}

/// Re-export command types.
pub mod command {
    pub use mlight_command::*;
}
