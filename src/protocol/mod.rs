//! Protocol module - wire format, frame encoding and the sequence window.
//!
//! This module implements the Lumberjack v1 binary protocol:
//! - Frame type tags and fixed sizes
//! - Window, data, compressed and ack frame encoding
//! - [`FrameEncoder`], the pluggable record-to-frame encoder
//! - [`SequenceWindow`], the sequence counter and ack accounting
//! - Frame buffer for decoding a byte stream on the collector side

mod encoder;
mod frame;
mod frame_buffer;
mod window;
mod wire_format;

pub use encoder::{Encoder, FrameEncoder};
pub use frame::{
    decode_compressed_frame, decode_data_frame, encode_ack_frame, encode_compressed_frame,
    encode_data_frame, encode_window_frame, Frame,
};
pub use frame_buffer::FrameBuffer;
pub use window::SequenceWindow;
pub use wire_format::{
    FrameType, ACK_FRAME_SIZE, COMPRESSED_HEADER_SIZE, DATA_HEADER_SIZE, DEFAULT_MAX_PAYLOAD_SIZE,
    DEFAULT_WINDOW_SIZE, PREFIX_SIZE, PROTOCOL_VERSION, SEQUENCE_MAX, WINDOW_FRAME_SIZE,
};
