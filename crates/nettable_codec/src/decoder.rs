//! Wire decoder.

use crate::error::{CodecError, CodecResult};
use crate::value::{EntryType, Value};

/// Decode a value from its wire bytes.
///
/// # Errors
///
/// Returns an error if the bytes are truncated, carry an unknown type tag,
/// or contain trailing data.
pub fn decode_value(bytes: &[u8]) -> CodecResult<Value> {
    let mut decoder = WireDecoder::new(bytes);
    let value = decoder.read_value()?;
    if !decoder.is_empty() {
        return Err(CodecError::invalid_structure("trailing bytes after value"));
    }
    Ok(value)
}

/// Maximum allowed byte/string length.
/// Claims above this fail before anything is allocated.
pub const MAX_BYTES_LENGTH: u64 = 16 * 1024 * 1024;

/// Maximum allowed element count for arrays.
pub const MAX_ARRAY_ELEMENTS: u64 = 1024 * 1024;

/// A wire decoder over a borrowed buffer.
pub struct WireDecoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> WireDecoder<'a> {
    /// Create a new decoder for the given bytes.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Check if all bytes have been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Get remaining bytes.
    pub fn remaining(&self) -> &[u8] {
        &self.data[self.pos..]
    }

    /// Read a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> CodecResult<u8> {
        let byte = *self.data.get(self.pos).ok_or(CodecError::UnexpectedEof)?;
        self.pos += 1;
        Ok(byte)
    }

    #[inline]
    fn read_exact(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        let end = self.pos.checked_add(len).ok_or(CodecError::UnexpectedEof)?;
        if end > self.data.len() {
            return Err(CodecError::UnexpectedEof);
        }
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    /// Read a big-endian u16.
    pub fn read_u16(&mut self) -> CodecResult<u16> {
        let b = self.read_exact(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    /// Read a big-endian u32.
    pub fn read_u32(&mut self) -> CodecResult<u32> {
        let b = self.read_exact(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a big-endian IEEE-754 double.
    pub fn read_f64(&mut self) -> CodecResult<f64> {
        let b = self.read_exact(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(b);
        Ok(f64::from_be_bytes(raw))
    }

    /// Read an unsigned LEB128 integer.
    pub fn read_uleb128(&mut self) -> CodecResult<u64> {
        let mut result: u64 = 0;
        let mut shift = 0u32;
        loop {
            let byte = self.read_u8()?;
            if shift == 63 && byte > 1 {
                return Err(CodecError::invalid_structure("LEB128 value overflows u64"));
            }
            result |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
            if shift > 63 {
                return Err(CodecError::invalid_structure("LEB128 value overflows u64"));
            }
        }
    }

    fn read_len(&mut self, max_allowed: u64) -> CodecResult<usize> {
        let claimed = self.read_uleb128()?;
        if claimed > max_allowed {
            return Err(CodecError::SizeLimitExceeded {
                claimed,
                max_allowed,
            });
        }
        usize::try_from(claimed).map_err(|_| CodecError::SizeLimitExceeded {
            claimed,
            max_allowed,
        })
    }

    /// Read a length-prefixed byte string.
    pub fn read_bytes(&mut self) -> CodecResult<Vec<u8>> {
        let len = self.read_len(MAX_BYTES_LENGTH)?;
        Ok(self.read_exact(len)?.to_vec())
    }

    /// Read a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> CodecResult<String> {
        let len = self.read_len(MAX_BYTES_LENGTH)?;
        let bytes = self.read_exact(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| CodecError::InvalidUtf8)
    }

    fn read_bool(&mut self) -> CodecResult<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            byte => Err(CodecError::InvalidBoolean { byte }),
        }
    }

    /// Read a type tag.
    pub fn read_type(&mut self) -> CodecResult<EntryType> {
        EntryType::from_code(self.read_u8()?)
    }

    /// Read a type tag followed by the value payload.
    pub fn read_value(&mut self) -> CodecResult<Value> {
        let ty = self.read_type()?;
        self.read_value_of(ty)
    }

    /// Read the payload of a value whose type tag was already read.
    pub fn read_value_of(&mut self, ty: EntryType) -> CodecResult<Value> {
        match ty {
            EntryType::Unassigned => Err(CodecError::invalid_structure(
                "unassigned type cannot carry a value",
            )),
            EntryType::Boolean => self.read_bool().map(Value::Boolean),
            EntryType::Double => self.read_f64().map(Value::Double),
            EntryType::String => self.read_string().map(Value::String),
            EntryType::Raw => self.read_bytes().map(Value::Raw),
            EntryType::Rpc => self.read_bytes().map(Value::Rpc),
            EntryType::BooleanArray => {
                let count = self.read_len(MAX_ARRAY_ELEMENTS)?;
                let mut items = Vec::with_capacity(count.min(self.remaining().len()));
                for _ in 0..count {
                    items.push(self.read_bool()?);
                }
                Ok(Value::BooleanArray(items))
            }
            EntryType::DoubleArray => {
                let count = self.read_len(MAX_ARRAY_ELEMENTS)?;
                let mut items = Vec::with_capacity(count.min(self.remaining().len() / 8));
                for _ in 0..count {
                    items.push(self.read_f64()?);
                }
                Ok(Value::DoubleArray(items))
            }
            EntryType::StringArray => {
                let count = self.read_len(MAX_ARRAY_ELEMENTS)?;
                let mut items = Vec::with_capacity(count.min(self.remaining().len()));
                for _ in 0..count {
                    items.push(self.read_string()?);
                }
                Ok(Value::StringArray(items))
            }
        }
    }
}
