//! Wire format constants and frame type tags.
//!
//! Every frame starts with a two byte prefix:
//! ```text
//! ┌─────────┬──────┬──────────────────────────┐
//! │ Version │ Type │ Body (type specific)     │
//! │ '1'     │ 1 B  │ u32 BE fields + bytes    │
//! └─────────┴──────┴──────────────────────────┘
//! ```
//!
//! All multi-byte integers are Big Endian unsigned 32-bit.

use crate::error::{LumberjackError, Result};

/// Protocol version byte sent by this client.
pub const PROTOCOL_VERSION: u8 = b'1';

/// Version + type prefix size in bytes.
pub const PREFIX_SIZE: usize = 2;

/// Window frame size: prefix + window size.
pub const WINDOW_FRAME_SIZE: usize = PREFIX_SIZE + 4;

/// Ack frame size: prefix + acknowledged sequence.
pub const ACK_FRAME_SIZE: usize = PREFIX_SIZE + 4;

/// Data frame header size: prefix + sequence + pair count.
pub const DATA_HEADER_SIZE: usize = PREFIX_SIZE + 4 + 4;

/// Compressed frame header size: prefix + compressed length.
pub const COMPRESSED_HEADER_SIZE: usize = PREFIX_SIZE + 4;

/// Highest sequence number before wrapping back to 1.
pub const SEQUENCE_MAX: u32 = u32::MAX;

/// Default window size when none is configured.
pub const DEFAULT_WINDOW_SIZE: u32 = 5000;

/// Default maximum length accepted for a single length-prefixed field
/// when decoding (64 MB).
pub const DEFAULT_MAX_PAYLOAD_SIZE: u32 = 64 * 1024 * 1024;

/// Frame type tag (second byte of every frame).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameType {
    /// Advertises the window size, sent once per session.
    Window = b'W',
    /// One encoded record at a sequence number.
    Data = b'D',
    /// zlib-compressed data frame bytes.
    Compressed = b'C',
    /// Peer acknowledgment of the highest received sequence.
    Ack = b'A',
}

impl FrameType {
    /// The tag byte on the wire.
    #[inline]
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for FrameType {
    type Error = LumberjackError;

    fn try_from(v: u8) -> Result<Self> {
        match v {
            b'W' => Ok(FrameType::Window),
            b'D' => Ok(FrameType::Data),
            b'C' => Ok(FrameType::Compressed),
            b'A' => Ok(FrameType::Ack),
            _ => Err(LumberjackError::Protocol(format!(
                "Unknown frame type: {:#04x}",
                v
            ))),
        }
    }
}
