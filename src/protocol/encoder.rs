//! Record-to-frame encoder.
//!
//! The [`Encoder`] trait is the seam between the client and the frame
//! layout, so a client can be driven with an alternative encoding (or a
//! recording encoder in tests). [`FrameEncoder`] is the Lumberjack v1
//! implementation.

use bytes::Bytes;

use super::frame::{encode_compressed_frame, encode_data_frame};
use crate::codec::{Record, DEFAULT_COMPRESSION_LEVEL};
use crate::error::Result;

/// Encodes records into wire frames.
pub trait Encoder {
    /// Encode `record` as a plain data frame.
    fn encode_frame(&self, record: &Record, sequence: u32) -> Result<Bytes>;

    /// Encode `record` as a compressed frame wrapping its data frame.
    fn encode_compressed_frame(&self, record: &Record, sequence: u32) -> Result<Bytes>;
}

/// Lumberjack v1 frame encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameEncoder {
    compression_level: u32,
}

impl FrameEncoder {
    /// Create an encoder with the default compression level.
    pub fn new() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }

    /// Create an encoder with a specific zlib level (clamped to 0-9).
    pub fn with_compression_level(level: u32) -> Self {
        Self {
            compression_level: level.min(9),
        }
    }

    /// The zlib level used for compressed frames.
    pub fn compression_level(&self) -> u32 {
        self.compression_level
    }
}

impl Default for FrameEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder for FrameEncoder {
    fn encode_frame(&self, record: &Record, sequence: u32) -> Result<Bytes> {
        Ok(encode_data_frame(record, sequence))
    }

    fn encode_compressed_frame(&self, record: &Record, sequence: u32) -> Result<Bytes> {
        encode_compressed_frame(record, sequence, self.compression_level)
    }
}
