//! zlib-wrapped deflate for compressed frames.
//!
//! Collectors expect the zlib container (2-byte header plus Adler-32
//! trailer), not raw deflate.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{LumberjackError, Result};

/// Default compression level.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Compress `input` into a single zlib stream.
pub fn compress(input: &[u8], level: u32) -> Result<Vec<u8>> {
    let mut enc = ZlibEncoder::new(Vec::with_capacity(input.len() / 2 + 16), Compression::new(level));
    enc.write_all(input)?;
    Ok(enc.finish()?)
}

/// Decompress a single zlib stream of at most `max_size` output bytes.
///
/// # Errors
///
/// Fails on a malformed stream or if the output would exceed `max_size`.
pub fn decompress(input: &[u8], max_size: u32) -> Result<Vec<u8>> {
    let limit = u64::from(max_size);
    let mut dec = ZlibDecoder::new(input).take(limit + 1);
    let mut out = Vec::new();
    dec.read_to_end(&mut out)
        .map_err(|e| LumberjackError::Protocol(format!("invalid zlib payload: {}", e)))?;
    if out.len() as u64 > limit {
        return Err(LumberjackError::Protocol(format!(
            "decompressed payload exceeds maximum {}",
            max_size
        )));
    }
    Ok(out)
}
