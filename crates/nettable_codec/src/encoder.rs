//! Wire encoder.

use crate::value::Value;
use bytes::BufMut;

/// Encode a value to its wire bytes (type tag followed by payload).
pub fn encode_value(value: &Value) -> Vec<u8> {
    let mut encoder = WireEncoder::new();
    encoder.write_value(value);
    encoder.into_bytes()
}

/// Number of bytes the unsigned LEB128 form of `v` takes.
pub fn uleb128_len(mut v: u64) -> usize {
    let mut len = 1;
    while v >= 0x80 {
        v >>= 7;
        len += 1;
    }
    len
}

/// A wire encoder.
///
/// Integers are big-endian; lengths and counts are unsigned LEB128;
/// strings are length-prefixed UTF-8 without a terminator.
pub struct WireEncoder {
    buffer: Vec<u8>,
}

impl WireEncoder {
    /// Create a new encoder.
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Create a new encoder with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Consume this encoder and return the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Get a reference to the encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Write a single byte.
    pub fn write_u8(&mut self, v: u8) {
        self.buffer.put_u8(v);
    }

    /// Write a big-endian u16.
    pub fn write_u16(&mut self, v: u16) {
        self.buffer.put_u16(v);
    }

    /// Write a big-endian u32.
    pub fn write_u32(&mut self, v: u32) {
        self.buffer.put_u32(v);
    }

    /// Write a big-endian IEEE-754 double.
    pub fn write_f64(&mut self, v: f64) {
        self.buffer.put_f64(v);
    }

    /// Write an unsigned LEB128 integer.
    #[allow(clippy::cast_possible_truncation)]
    pub fn write_uleb128(&mut self, mut v: u64) {
        loop {
            let byte = (v & 0x7f) as u8;
            v >>= 7;
            if v == 0 {
                self.buffer.put_u8(byte);
                return;
            }
            self.buffer.put_u8(byte | 0x80);
        }
    }

    /// Write a length-prefixed byte string.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.write_uleb128(bytes.len() as u64);
        self.buffer.put_slice(bytes);
    }

    /// Write a length-prefixed UTF-8 string.
    pub fn write_string(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
    }

    /// Write a type tag followed by the value payload.
    pub fn write_value(&mut self, value: &Value) {
        self.write_u8(value.entry_type().to_code());
        match value {
            Value::Boolean(b) => self.write_u8(u8::from(*b)),
            Value::Double(n) => self.write_f64(*n),
            Value::String(s) => self.write_string(s),
            Value::Raw(b) | Value::Rpc(b) => self.write_bytes(b),
            Value::BooleanArray(items) => {
                self.write_uleb128(items.len() as u64);
                for b in items {
                    self.write_u8(u8::from(*b));
                }
            }
            Value::DoubleArray(items) => {
                self.write_uleb128(items.len() as u64);
                for n in items {
                    self.write_f64(*n);
                }
            }
            Value::StringArray(items) => {
                self.write_uleb128(items.len() as u64);
                for s in items {
                    self.write_string(s);
                }
            }
        }
    }
}

impl Default for WireEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_boolean() {
        assert_eq!(encode_value(&Value::Boolean(false)), vec![0x01, 0x00]);
        assert_eq!(encode_value(&Value::Boolean(true)), vec![0x01, 0x01]);
    }

    #[test]
    fn encode_double_is_big_endian() {
        assert_eq!(
            encode_value(&Value::Double(1.0)),
            vec![0x02, 0x3f, 0xf0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn encode_string_length_prefixed() {
        assert_eq!(
            encode_value(&Value::from("hi")),
            vec![0x04, 0x02, b'h', b'i']
        );
        // Embedded NUL is kept as-is
        assert_eq!(
            encode_value(&Value::from("a\0b")),
            vec![0x04, 0x03, b'a', 0x00, b'b']
        );
    }

    #[test]
    fn encode_uleb128() {
        let mut enc = WireEncoder::new();
        enc.write_uleb128(0);
        enc.write_uleb128(127);
        enc.write_uleb128(128);
        enc.write_uleb128(624_485);
        assert_eq!(
            enc.into_bytes(),
            vec![0x00, 0x7f, 0x80, 0x01, 0xe5, 0x8e, 0x26]
        );
        assert_eq!(uleb128_len(0), 1);
        assert_eq!(uleb128_len(127), 1);
        assert_eq!(uleb128_len(128), 2);
        assert_eq!(uleb128_len(624_485), 3);
    }

    #[test]
    fn encode_arrays() {
        assert_eq!(
            encode_value(&Value::BooleanArray(vec![true, false])),
            vec![0x10, 0x02, 0x01, 0x00]
        );
        assert_eq!(
            encode_value(&Value::StringArray(vec!["a".into(), String::new()])),
            vec![0x40, 0x02, 0x01, b'a', 0x00]
        );
        assert_eq!(encode_value(&Value::DoubleArray(vec![])), vec![0x20, 0x00]);
    }

    #[test]
    fn encode_raw_and_rpc_use_distinct_tags() {
        assert_eq!(encode_value(&Value::Raw(vec![9])), vec![0x08, 0x01, 9]);
        assert_eq!(encode_value(&Value::Rpc(vec![9])), vec![0x80, 0x01, 9]);
    }
}
