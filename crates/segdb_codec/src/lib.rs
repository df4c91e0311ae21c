//! # SegDB Codec
//!
//! Scalar attribute values and the durable segment record format.
//!
//! This crate provides:
//! - [`Value`], the closed scalar type used for index keys and query context
//! - [`SegmentRecord`], the persisted shape of a segment
//! - A versioned CBOR envelope for records ([`encode_record`], [`decode_record`])
//!
//! ## Numeric normalization
//!
//! Integral floats are folded into [`Value::Integer`] on ingestion, so `1` and
//! `1.0` always compare equal and hash identically. Non-finite floats are
//! rejected by the codec.
//!
//! ## Usage
//!
//! ```
//! use segdb_codec::{decode_record, encode_record, SegmentRecord, Value};
//!
//! let record = SegmentRecord::new("seg1", "level >= 1")
//!     .with_data("payload")
//!     .with_index("idx1", 1.0);
//!
//! let bytes = encode_record(&record).unwrap();
//! let decoded = decode_record(&bytes).unwrap();
//! assert_eq!(decoded.indexes["idx1"], Value::Integer(1));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod record;
mod value;

pub use error::{CodecError, CodecResult};
pub use record::{decode_record, encode_record, SegmentRecord, FORMAT_VERSION};
pub use value::Value;

/// Trait for types that can be encoded to the durable format.
pub trait Encode {
    /// Encode this value to bytes.
    fn encode(&self) -> CodecResult<Vec<u8>>;
}

/// Trait for types that can be decoded from the durable format.
pub trait Decode: Sized {
    /// Decode this value from bytes.
    fn decode(bytes: &[u8]) -> CodecResult<Self>;
}

impl Encode for SegmentRecord {
    fn encode(&self) -> CodecResult<Vec<u8>> {
        encode_record(self)
    }
}

impl Decode for SegmentRecord {
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        decode_record(bytes)
    }
}
