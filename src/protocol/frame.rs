//! Frame encoding and decoding.
//!
//! Encoders produce the exact byte layout sent to a collector. The decoding
//! half ([`Frame::decode`], [`decode_data_frame`]) is the peer's view of the
//! same bytes; the client itself only ever decodes ACK frames.
//!
//! # Example
//!
//! ```
//! use lumberjack_client::codec::to_record;
//! use lumberjack_client::protocol::{decode_data_frame, encode_data_frame};
//! use serde_json::json;
//!
//! let record = to_record(&json!({"key": "value"})).unwrap();
//! let bytes = encode_data_frame(&record, 1);
//! assert_eq!(&bytes[..2], b"1D");
//!
//! let (seq, pairs) = decode_data_frame(&bytes).unwrap();
//! assert_eq!(seq, 1);
//! assert_eq!(pairs, vec![("key".to_string(), "value".to_string())]);
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::wire_format::{
    FrameType, ACK_FRAME_SIZE, COMPRESSED_HEADER_SIZE, DATA_HEADER_SIZE, DEFAULT_MAX_PAYLOAD_SIZE,
    PROTOCOL_VERSION, WINDOW_FRAME_SIZE,
};
use crate::codec::{compress, decompress, flatten, resolve, Record};
use crate::error::{LumberjackError, Result};

/// A decoded protocol frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Window size advertisement.
    Window { window_size: u32 },
    /// Key/value pairs of one record.
    Data {
        sequence: u32,
        pairs: Vec<(String, String)>,
    },
    /// zlib stream wrapping one or more frames.
    Compressed { payload: Bytes },
    /// Highest sequence received by the peer.
    Ack { sequence: u32 },
}

impl Frame {
    /// The frame's type tag.
    pub fn frame_type(&self) -> FrameType {
        match self {
            Frame::Window { .. } => FrameType::Window,
            Frame::Data { .. } => FrameType::Data,
            Frame::Compressed { .. } => FrameType::Compressed,
            Frame::Ack { .. } => FrameType::Ack,
        }
    }

    /// Encode this frame to its wire bytes.
    pub fn encode(&self) -> Bytes {
        match self {
            Frame::Window { window_size } => encode_window_frame(*window_size),
            Frame::Data { sequence, pairs } => encode_pairs(*sequence, pairs),
            Frame::Compressed { payload } => wrap_compressed(payload),
            Frame::Ack { sequence } => encode_ack_frame(*sequence),
        }
    }

    /// Decode one frame from the start of `buf`.
    ///
    /// Returns `Ok(None)` if `buf` does not yet hold a complete frame,
    /// otherwise the frame and the number of bytes it occupied.
    ///
    /// # Errors
    ///
    /// Fails on an unknown version or type byte, a length field above
    /// `max_payload_size`, or non UTF-8 key/value text.
    pub fn decode(buf: &[u8], max_payload_size: u32) -> Result<Option<(Frame, usize)>> {
        let mut cur = buf;

        let Some(version) = take_u8(&mut cur) else {
            return Ok(None);
        };
        if version != PROTOCOL_VERSION {
            return Err(LumberjackError::Protocol(format!(
                "Unsupported protocol version: {:#04x}",
                version
            )));
        }
        let Some(type_byte) = take_u8(&mut cur) else {
            return Ok(None);
        };

        let frame = match FrameType::try_from(type_byte)? {
            FrameType::Window => {
                let Some(window_size) = take_u32(&mut cur) else {
                    return Ok(None);
                };
                Frame::Window { window_size }
            }
            FrameType::Ack => {
                let Some(sequence) = take_u32(&mut cur) else {
                    return Ok(None);
                };
                Frame::Ack { sequence }
            }
            FrameType::Compressed => {
                let Some(len) = take_u32(&mut cur) else {
                    return Ok(None);
                };
                check_len(len, max_payload_size)?;
                let Some(payload) = take_bytes(&mut cur, len as usize) else {
                    return Ok(None);
                };
                Frame::Compressed {
                    payload: Bytes::copy_from_slice(payload),
                }
            }
            FrameType::Data => {
                let (Some(sequence), Some(count)) = (take_u32(&mut cur), take_u32(&mut cur)) else {
                    return Ok(None);
                };
                let mut pairs = Vec::with_capacity(count.min(1024) as usize);
                for _ in 0..count {
                    let Some(key) = take_text(&mut cur, max_payload_size)? else {
                        return Ok(None);
                    };
                    let Some(value) = take_text(&mut cur, max_payload_size)? else {
                        return Ok(None);
                    };
                    pairs.push((key, value));
                }
                Frame::Data { sequence, pairs }
            }
        };

        Ok(Some((frame, buf.len() - cur.len())))
    }

    /// Decompress a `Compressed` frame and decode the frames inside it.
    ///
    /// The inflated payload may not exceed `max_payload_size` bytes. Other
    /// frame kinds are returned unchanged as a single-element list.
    pub fn inflate(&self, max_payload_size: u32) -> Result<Vec<Frame>> {
        let Frame::Compressed { payload } = self else {
            return Ok(vec![self.clone()]);
        };

        let inner = decompress(payload, max_payload_size)?;
        let mut rest = &inner[..];
        let mut frames = Vec::new();
        while !rest.is_empty() {
            match Frame::decode(rest, max_payload_size)? {
                Some((frame, used)) => {
                    frames.push(frame);
                    rest = &rest[used..];
                }
                None => {
                    return Err(LumberjackError::Protocol(
                        "Truncated frame inside compressed payload".to_string(),
                    ))
                }
            }
        }
        Ok(frames)
    }
}

/// Encode the window size advertisement: `'1' 'W' <u32 window_size>`.
pub fn encode_window_frame(window_size: u32) -> Bytes {
    let mut buf = BytesMut::with_capacity(WINDOW_FRAME_SIZE);
    put_prefix(&mut buf, FrameType::Window);
    buf.put_u32(window_size);
    buf.freeze()
}

/// Encode an acknowledgment: `'1' 'A' <u32 sequence>`.
///
/// Sent by collectors; used here by tests and the demo collector.
pub fn encode_ack_frame(sequence: u32) -> Bytes {
    let mut buf = BytesMut::with_capacity(ACK_FRAME_SIZE);
    put_prefix(&mut buf, FrameType::Ack);
    buf.put_u32(sequence);
    buf.freeze()
}

/// Encode a record as a data frame at `sequence`.
///
/// Pairs follow [`flatten`] order. Keys that do not resolve are skipped and
/// not counted.
pub fn encode_data_frame(record: &Record, sequence: u32) -> Bytes {
    let pairs: Vec<(String, String)> = flatten(record)
        .into_iter()
        .filter_map(|key| resolve(record, &key).map(|value| (key, value)))
        .collect();
    encode_pairs(sequence, &pairs)
}

/// Encode a record as a data frame and wrap it in a compressed frame:
/// `'1' 'C' <u32 len> <zlib(data frame)>`.
pub fn encode_compressed_frame(record: &Record, sequence: u32, level: u32) -> Result<Bytes> {
    let data = encode_data_frame(record, sequence);
    let compressed = compress(&data, level)?;
    Ok(wrap_compressed(&compressed))
}

/// Decode a single uncompressed data frame into its sequence and pairs.
pub fn decode_data_frame(bytes: &[u8]) -> Result<(u32, Vec<(String, String)>)> {
    match Frame::decode(bytes, u32::MAX)? {
        Some((Frame::Data { sequence, pairs }, _)) => Ok((sequence, pairs)),
        Some((other, _)) => Err(LumberjackError::Protocol(format!(
            "Expected data frame, got {:?}",
            other.frame_type()
        ))),
        None => Err(LumberjackError::Protocol("Truncated data frame".to_string())),
    }
}

/// Unwrap a compressed frame and return the decompressed inner bytes.
///
/// The inflated size is capped at [`DEFAULT_MAX_PAYLOAD_SIZE`].
pub fn decode_compressed_frame(bytes: &[u8]) -> Result<Vec<u8>> {
    match Frame::decode(bytes, DEFAULT_MAX_PAYLOAD_SIZE)? {
        Some((Frame::Compressed { payload }, _)) => decompress(&payload, DEFAULT_MAX_PAYLOAD_SIZE),
        Some((other, _)) => Err(LumberjackError::Protocol(format!(
            "Expected compressed frame, got {:?}",
            other.frame_type()
        ))),
        None => Err(LumberjackError::Protocol(
            "Truncated compressed frame".to_string(),
        )),
    }
}

fn encode_pairs(sequence: u32, pairs: &[(String, String)]) -> Bytes {
    let body: usize = pairs.iter().map(|(k, v)| 8 + k.len() + v.len()).sum();
    let mut buf = BytesMut::with_capacity(DATA_HEADER_SIZE + body);
    put_prefix(&mut buf, FrameType::Data);
    buf.put_u32(sequence);
    buf.put_u32(pairs.len() as u32);
    for (key, value) in pairs {
        buf.put_u32(key.len() as u32);
        buf.put_slice(key.as_bytes());
        buf.put_u32(value.len() as u32);
        buf.put_slice(value.as_bytes());
    }
    buf.freeze()
}

fn wrap_compressed(compressed: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(COMPRESSED_HEADER_SIZE + compressed.len());
    put_prefix(&mut buf, FrameType::Compressed);
    buf.put_u32(compressed.len() as u32);
    buf.put_slice(compressed);
    buf.freeze()
}

#[inline]
fn put_prefix(buf: &mut BytesMut, frame_type: FrameType) {
    buf.put_u8(PROTOCOL_VERSION);
    buf.put_u8(frame_type.as_byte());
}

fn check_len(len: u32, max_payload_size: u32) -> Result<()> {
    if len > max_payload_size {
        return Err(LumberjackError::Protocol(format!(
            "Field length {} exceeds maximum {}",
            len, max_payload_size
        )));
    }
    Ok(())
}

fn take_u8(cur: &mut &[u8]) -> Option<u8> {
    (cur.remaining() >= 1).then(|| cur.get_u8())
}

fn take_u32(cur: &mut &[u8]) -> Option<u32> {
    (cur.remaining() >= 4).then(|| cur.get_u32())
}

fn take_bytes<'a>(cur: &mut &'a [u8], n: usize) -> Option<&'a [u8]> {
    if cur.len() < n {
        return None;
    }
    let (head, tail) = cur.split_at(n);
    *cur = tail;
    Some(head)
}

fn take_text(cur: &mut &[u8], max_payload_size: u32) -> Result<Option<String>> {
    let Some(len) = take_u32(cur) else {
        return Ok(None);
    };
    check_len(len, max_payload_size)?;
    let Some(raw) = take_bytes(cur, len as usize) else {
        return Ok(None);
    };
    String::from_utf8(raw.to_vec())
        .map(Some)
        .map_err(|_| LumberjackError::Protocol("Key or value is not valid UTF-8".to_string()))
}
