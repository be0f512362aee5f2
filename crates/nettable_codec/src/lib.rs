//! # NetTable Codec
//!
//! Binary wire encoding for NetTable entry values.
//!
//! ## Value Layout
//!
//! ```text
//! ┌──────────┬────────────────────────────────────────────┐
//! │ Type tag │ Payload                                    │
//! │ 1 byte   │ boolean: 1 byte (0 or 1)                   │
//! │          │ double:  8 bytes, big-endian IEEE-754      │
//! │          │ string/raw/rpc: ULEB128 length + bytes     │
//! │          │ arrays: ULEB128 count + elements           │
//! └──────────┴────────────────────────────────────────────┘
//! ```
//!
//! Type tags are single bits (`0x01` boolean … `0x80` rpc) so a set of
//! types is an OR of tags. Decoding an unknown tag fails with
//! [`CodecError::UnknownType`]; it never panics.
//!
//! ## Usage
//!
//! ```
//! use nettable_codec::{decode_value, encode_value, Value};
//!
//! let value = Value::Double(42.0);
//! let bytes = encode_value(&value);
//! assert_eq!(decode_value(&bytes).unwrap(), value);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod value;

pub use decoder::{decode_value, WireDecoder, MAX_ARRAY_ELEMENTS, MAX_BYTES_LENGTH};
pub use encoder::{encode_value, uleb128_len, WireEncoder};
pub use error::{CodecError, CodecResult};
pub use value::{EntryType, EntryTypes, Value};

/// Trait for types that can be written to the wire.
pub trait Encode {
    /// Append the wire form of this value to `encoder`.
    fn encode_to(&self, encoder: &mut WireEncoder);

    /// Encode this value to a fresh byte vector.
    fn encode(&self) -> Vec<u8> {
        let mut encoder = WireEncoder::new();
        self.encode_to(&mut encoder);
        encoder.into_bytes()
    }
}

/// Trait for types that can be read from the wire.
pub trait Decode: Sized {
    /// Read one value from `decoder`.
    fn decode_from(decoder: &mut WireDecoder<'_>) -> CodecResult<Self>;

    /// Decode this value from a complete byte slice.
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        let mut decoder = WireDecoder::new(bytes);
        let value = Self::decode_from(&mut decoder)?;
        if !decoder.is_empty() {
            return Err(CodecError::invalid_structure("trailing bytes"));
        }
        Ok(value)
    }
}

impl Encode for Value {
    fn encode_to(&self, encoder: &mut WireEncoder) {
        encoder.write_value(self);
    }
}

impl Decode for Value {
    fn decode_from(decoder: &mut WireDecoder<'_>) -> CodecResult<Self> {
        decoder.read_value()
    }
}
