use std::time::Duration;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::debug;

use crate::error::{FrameError, Result};
use crate::message::MESSAGE_PAYLOAD_SIZE;

/// Start-of-frame sentinel.
pub const START_BYTE: u8 = 0xFD;

/// Bytes added around a payload: start byte + checksum.
pub const FRAME_OVERHEAD: usize = 2;

/// Default pause after every byte written to the bus.
pub const DEFAULT_BYTE_DELAY: Duration = Duration::from_millis(1);

/// Rotate-left-3/xor checksum over `payload`.
///
/// Order sensitive: `[1, 2]` and `[2, 1]` produce different sums.
pub fn compute_checksum(payload: &[u8]) -> u8 {
    payload
        .iter()
        .fold(0u8, |acc, &byte| acc.rotate_left(3) ^ byte)
}

/// Encode a payload into the wire format.
///
/// Wire format:
/// ```text
/// ┌────────────┬─────────────────┬────────────┐
/// │ Start (1B) │ Payload         │ Csum (1B)  │
/// │ 0xFD       │ (N bytes)       │ rl3/xor    │
/// └────────────┴─────────────────┴────────────┘
/// ```
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) {
    dst.reserve(payload.len() + FRAME_OVERHEAD);
    dst.put_u8(START_BYTE);
    dst.put_slice(payload);
    dst.put_u8(compute_checksum(payload));
}

/// Encode a payload into a freshly allocated frame.
pub fn encode(payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(payload.len() + FRAME_OVERHEAD);
    encode_frame(payload, &mut buf);
    buf.freeze()
}

/// Decode one frame carrying a `payload_len`-byte payload from a buffer.
///
/// The wire has no length field, so the caller supplies the payload size.
/// Bytes ahead of the next start byte are discarded. Returns `Ok(None)` if
/// the buffer doesn't contain a complete frame yet. On a checksum mismatch
/// only the start byte is consumed, so the next call resynchronises.
pub fn decode_frame(src: &mut BytesMut, payload_len: usize) -> Result<Option<Bytes>> {
    match src.iter().position(|&b| b == START_BYTE) {
        Some(0) => {}
        Some(skip) => {
            debug!(skipped = skip, "discarding bytes ahead of start byte");
            src.advance(skip);
        }
        None => {
            if !src.is_empty() {
                debug!(skipped = src.len(), "no start byte in buffer");
                src.clear();
            }
            return Ok(None);
        }
    }

    let total = payload_len + FRAME_OVERHEAD;
    if src.len() < total {
        return Ok(None); // Need more data
    }

    let expected = compute_checksum(&src[1..1 + payload_len]);
    let actual = src[1 + payload_len];
    if expected != actual {
        src.advance(1);
        return Err(FrameError::ChecksumMismatch { expected, actual });
    }

    src.advance(1);
    let payload = src.split_to(payload_len).freeze();
    src.advance(1);
    Ok(Some(payload))
}

/// Configuration for the frame reader/writer.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Payload size expected by the reader. Default: 6 (bus message).
    pub payload_len: usize,
    /// Pause after each byte written. Default: 1 ms.
    pub byte_delay: Duration,
}

impl FrameConfig {
    /// Default configuration without inter-byte pacing.
    pub fn unpaced() -> Self {
        Self {
            byte_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            payload_len: MESSAGE_PAYLOAD_SIZE,
            byte_delay: DEFAULT_BYTE_DELAY,
        }
    }
}
