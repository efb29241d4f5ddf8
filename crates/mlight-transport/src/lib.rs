//! Serial transport for the mlight dimmer bus.
//!
//! The bus is a half-duplex serial line. This crate opens it and hands back a
//! [`BusStream`] that the framing layer treats as an opaque byte sink (and,
//! for diagnostics, a byte source).
//!
//! This is the lowest layer of mlight. Everything else builds on top of
//! the [`BusStream`] type provided here.

pub mod error;
pub mod serial;
pub mod traits;

pub use error::{Result, TransportError};
pub use serial::{open, SerialConfig, DEFAULT_BAUD_RATE};
pub use traits::BusStream;
