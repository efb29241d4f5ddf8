//! Bus state message carried inside a frame.

use bytes::Bytes;

use crate::codec::{encode, FRAME_OVERHEAD};
use crate::error::{FrameError, Result};

/// Number of dimmable outputs per slave.
pub const CHANNEL_COUNT: usize = 4;

/// Payload: address (1) + channels (4) + nonce (1) = 6 bytes.
pub const MESSAGE_PAYLOAD_SIZE: usize = 2 + CHANNEL_COUNT;

/// Bytes on the wire for one message.
pub const MESSAGE_WIRE_SIZE: usize = MESSAGE_PAYLOAD_SIZE + FRAME_OVERHEAD;

/// The full state of one slave as broadcast on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BusMessage {
    /// Slave address.
    pub address: u8,
    /// Brightness per channel.
    pub channels: [u8; CHANNEL_COUNT],
    /// Changes only when `channels` changes between broadcasts.
    pub nonce: u8,
}

impl BusMessage {
    /// Create a new message.
    pub fn new(address: u8, channels: [u8; CHANNEL_COUNT], nonce: u8) -> Self {
        Self {
            address,
            channels,
            nonce,
        }
    }

    /// Payload bytes in wire order.
    pub fn payload(&self) -> [u8; MESSAGE_PAYLOAD_SIZE] {
        let [ch0, ch1, ch2, ch3] = self.channels;
        [self.address, ch0, ch1, ch2, ch3, self.nonce]
    }

    /// Parse a payload produced by [`BusMessage::payload`].
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        match *payload {
            [address, ch0, ch1, ch2, ch3, nonce] => {
                Ok(Self::new(address, [ch0, ch1, ch2, ch3], nonce))
            }
            _ => Err(FrameError::InvalidLength {
                len: payload.len(),
                expected: MESSAGE_PAYLOAD_SIZE,
            }),
        }
    }

    /// Encode into a complete frame.
    pub fn encode(&self) -> Bytes {
        encode(&self.payload())
    }

    /// True when every channel is off.
    pub fn is_all_off(&self) -> bool {
        self.channels.iter().all(|&level| level == 0)
    }
}
