//! Codec module - record flattening and payload compression.
//!
//! - [`flatten`] / [`resolve`] turn a nested [`Record`] into the flat
//!   key/value text pairs carried by a data frame
//! - [`compress`] / [`decompress`] wrap data frames in a zlib stream
//!
//! # Example
//!
//! ```
//! use lumberjack_client::codec::{compress, decompress, to_record, flatten};
//! use serde_json::json;
//!
//! let record = to_record(&json!({"host": "web-1", "http": {"status": 200}})).unwrap();
//! assert_eq!(flatten(&record), vec!["host", "http.status"]);
//!
//! let packed = compress(b"payload", 6).unwrap();
//! assert_eq!(decompress(&packed, 1024).unwrap(), b"payload");
//! ```

mod record;
mod zlib;

pub use record::{flatten, resolve, stringify, stringify_record, to_record, Record};
pub use zlib::{compress, decompress, DEFAULT_COMPRESSION_LEVEL};
