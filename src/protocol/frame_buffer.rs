//! Frame buffer for accumulating partial reads on the collector side.
//!
//! Uses `bytes::BytesMut` for buffer management. Bytes are appended as they
//! arrive; every complete frame at the front of the buffer is decoded and
//! consumed. A frame split across reads stays buffered until the rest
//! arrives.
//!
//! # Example
//!
//! ```
//! use lumberjack_client::protocol::{encode_window_frame, Frame, FrameBuffer};
//!
//! let mut buffer = FrameBuffer::new();
//! let bytes = encode_window_frame(10);
//!
//! assert!(buffer.push(&bytes[..3]).unwrap().is_empty());
//! let frames = buffer.push(&bytes[3..]).unwrap();
//! assert_eq!(frames, vec![Frame::Window { window_size: 10 }]);
//! ```

use bytes::{Buf, BytesMut};

use super::wire_format::DEFAULT_MAX_PAYLOAD_SIZE;
use super::Frame;
use crate::error::Result;

/// Buffer for accumulating incoming bytes and extracting complete frames.
pub struct FrameBuffer {
    /// Accumulated bytes from socket reads.
    buffer: BytesMut,
    /// Maximum allowed length for any length-prefixed field.
    max_payload_size: u32,
    /// Expand compressed frames into the frames they carry.
    inflate: bool,
}

impl FrameBuffer {
    /// Create a new frame buffer with default settings.
    ///
    /// Default capacity: 64KB, max payload: 64MB, compressed frames are
    /// returned as-is.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(64 * 1024),
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
            inflate: false,
        }
    }

    /// Create a new frame buffer with custom max payload size.
    pub fn with_max_payload(max_payload_size: u32) -> Self {
        Self {
            max_payload_size,
            ..Self::new()
        }
    }

    /// Return the frames inside compressed frames instead of the
    /// compressed frames themselves.
    pub fn inflating(mut self) -> Self {
        self.inflate = true;
        self
    }

    /// Push data into the buffer and extract all complete frames.
    ///
    /// # Errors
    ///
    /// Returns error on malformed frames or a field exceeding
    /// `max_payload_size`.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Frame>> {
        self.buffer.extend_from_slice(data);

        let mut frames = Vec::new();
        while let Some((frame, used)) = Frame::decode(&self.buffer, self.max_payload_size)? {
            self.buffer.advance(used);
            if self.inflate {
                frames.extend(frame.inflate(self.max_payload_size)?);
            } else {
                frames.push(frame);
            }
        }

        Ok(frames)
    }

    /// Get the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drop any buffered partial frame.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{to_record, DEFAULT_COMPRESSION_LEVEL};
    use crate::protocol::{
        encode_ack_frame, encode_compressed_frame, encode_data_frame, encode_window_frame,
    };
    use serde_json::json;

    fn data_bytes(seq: u32) -> Vec<u8> {
        let record = to_record(&json!({"line": format!("event {}", seq)})).unwrap();
        encode_data_frame(&record, seq).to_vec()
    }

    #[test]
    fn test_multiple_frames_in_one_push() {
        let mut buffer = FrameBuffer::new();

        let mut combined = encode_window_frame(3).to_vec();
        combined.extend(data_bytes(1));
        combined.extend(data_bytes(2));

        let frames = buffer.push(&combined).unwrap();

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0], Frame::Window { window_size: 3 });
        assert!(matches!(frames[1], Frame::Data { sequence: 1, .. }));
        assert!(matches!(frames[2], Frame::Data { sequence: 2, .. }));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_mixed_complete_and_partial() {
        let mut buffer = FrameBuffer::new();

        let second = data_bytes(2);
        let mut data = data_bytes(1);
        data.extend_from_slice(&second[..5]);

        let frames = buffer.push(&data).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(buffer.len(), 5);

        let frames = buffer.push(&second[5..]).unwrap();
        assert_eq!(frames.len(), 1);
        assert!(matches!(frames[0], Frame::Data { sequence: 2, .. }));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut buffer = FrameBuffer::new();
        let bytes = data_bytes(7);

        let mut all_frames = Vec::new();
        for byte in &bytes {
            all_frames.extend(buffer.push(&[*byte]).unwrap());
        }

        assert_eq!(all_frames.len(), 1);
        assert_eq!(
            all_frames[0],
            Frame::Data {
                sequence: 7,
                pairs: vec![("line".to_string(), "event 7".to_string())],
            }
        );
    }

    #[test]
    fn test_inflating_expands_compressed() {
        let mut buffer = FrameBuffer::new().inflating();
        let record = to_record(&json!({"k": "v"})).unwrap();
        let bytes = encode_compressed_frame(&record, 5, DEFAULT_COMPRESSION_LEVEL).unwrap();

        let frames = buffer.push(&bytes).unwrap();
        assert_eq!(
            frames,
            vec![Frame::Data {
                sequence: 5,
                pairs: vec![("k".to_string(), "v".to_string())],
            }]
        );
    }

    #[test]
    fn test_compressed_kept_without_inflating() {
        let mut buffer = FrameBuffer::new();
        let record = to_record(&json!({"k": "v"})).unwrap();
        let bytes = encode_compressed_frame(&record, 5, DEFAULT_COMPRESSION_LEVEL).unwrap();

        let frames = buffer.push(&bytes).unwrap();
        assert_eq!(frames.len(), 1);
        assert!(matches!(frames[0], Frame::Compressed { .. }));
    }

    #[test]
    fn test_max_payload_validation() {
        let mut buffer = FrameBuffer::with_max_payload(4);
        let result = buffer.push(&data_bytes(1));

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("exceeds maximum"));
    }

    #[test]
    fn test_clear_drops_partial() {
        let mut buffer = FrameBuffer::new();
        buffer.push(&encode_ack_frame(1)[..3]).unwrap();
        assert_eq!(buffer.len(), 3);

        buffer.clear();
        assert!(buffer.is_empty());
    }
}
