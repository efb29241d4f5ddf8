//! Framing for the mlight dimmer bus.
//!
//! Every message on the wire is:
//! - A start byte (`0xFD`)
//! - The payload, verbatim (no length field, no escaping)
//! - A one-byte rotate-left-3/xor checksum over the payload
//!
//! Bus state messages carry a 6-byte payload: address, four channel
//! brightness values and a nonce byte, for 8 bytes on the wire.

pub mod codec;
pub mod error;
pub mod message;
pub mod reader;
pub mod writer;

pub use codec::{
    compute_checksum, decode_frame, encode, encode_frame, FrameConfig, DEFAULT_BYTE_DELAY,
    FRAME_OVERHEAD, START_BYTE,
};
pub use error::{FrameError, Result};
pub use message::{BusMessage, CHANNEL_COUNT, MESSAGE_PAYLOAD_SIZE, MESSAGE_WIRE_SIZE};
pub use reader::FrameReader;
pub use writer::FrameWriter;
