//! Typed entry values.

use crate::decoder::{MAX_ARRAY_ELEMENTS, MAX_BYTES_LENGTH};
use crate::encoder::uleb128_len;
use crate::error::{CodecError, CodecResult};
use serde::Serialize;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// The type of an entry value.
///
/// Codes are single bits rather than sequential numbers so that a set of
/// types can be expressed as an OR of codes (see [`EntryTypes`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    /// No value has been assigned.
    Unassigned,
    /// Boolean.
    Boolean,
    /// 64-bit IEEE-754 number.
    Double,
    /// UTF-8 string.
    String,
    /// Opaque bytes.
    Raw,
    /// Array of booleans.
    BooleanArray,
    /// Array of numbers.
    DoubleArray,
    /// Array of strings.
    StringArray,
    /// Remote procedure definition blob.
    Rpc,
}

impl EntryType {
    /// Returns the wire code for this type.
    pub fn to_code(self) -> u8 {
        match self {
            EntryType::Unassigned => 0x00,
            EntryType::Boolean => 0x01,
            EntryType::Double => 0x02,
            EntryType::String => 0x04,
            EntryType::Raw => 0x08,
            EntryType::BooleanArray => 0x10,
            EntryType::DoubleArray => 0x20,
            EntryType::StringArray => 0x40,
            EntryType::Rpc => 0x80,
        }
    }

    /// Converts from a wire code.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnknownType`] for any code that is not exactly
    /// one of the defined type bits (or zero).
    pub fn from_code(code: u8) -> CodecResult<Self> {
        match code {
            0x00 => Ok(EntryType::Unassigned),
            0x01 => Ok(EntryType::Boolean),
            0x02 => Ok(EntryType::Double),
            0x04 => Ok(EntryType::String),
            0x08 => Ok(EntryType::Raw),
            0x10 => Ok(EntryType::BooleanArray),
            0x20 => Ok(EntryType::DoubleArray),
            0x40 => Ok(EntryType::StringArray),
            0x80 => Ok(EntryType::Rpc),
            _ => Err(CodecError::UnknownType { code }),
        }
    }

    /// Human-readable name, as used in logs and the CLI.
    pub fn name(self) -> &'static str {
        match self {
            EntryType::Unassigned => "unassigned",
            EntryType::Boolean => "boolean",
            EntryType::Double => "double",
            EntryType::String => "string",
            EntryType::Raw => "raw",
            EntryType::BooleanArray => "boolean[]",
            EntryType::DoubleArray => "double[]",
            EntryType::StringArray => "string[]",
            EntryType::Rpc => "rpc",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of entry types, built by OR-ing type codes.
///
/// The empty set is treated as "all types" by lookups that accept a type
/// filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EntryTypes(u8);

impl EntryTypes {
    /// No types (matches everything when used as a filter).
    pub const ANY: EntryTypes = EntryTypes(0);

    /// Builds a set from a raw bitmask.
    pub const fn from_bits(bits: u8) -> Self {
        EntryTypes(bits)
    }

    /// Returns the raw bitmask.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns true if the set contains `ty`, or if the set is empty.
    pub fn matches(self, ty: EntryType) -> bool {
        self.0 == 0 || self.0 & ty.to_code() != 0
    }
}

impl From<EntryType> for EntryTypes {
    fn from(ty: EntryType) -> Self {
        EntryTypes(ty.to_code())
    }
}

impl BitOr for EntryType {
    type Output = EntryTypes;

    fn bitor(self, rhs: EntryType) -> EntryTypes {
        EntryTypes(self.to_code() | rhs.to_code())
    }
}

impl BitOr<EntryType> for EntryTypes {
    type Output = EntryTypes;

    fn bitor(self, rhs: EntryType) -> EntryTypes {
        EntryTypes(self.0 | rhs.to_code())
    }
}

impl BitOrAssign<EntryType> for EntryTypes {
    fn bitor_assign(&mut self, rhs: EntryType) {
        self.0 |= rhs.to_code();
    }
}

/// A typed entry value.
///
/// The type tag is carried by the variant itself; it is never inferred
/// from the payload.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Boolean value.
    Boolean(bool),
    /// Number value.
    Double(f64),
    /// String value. May contain embedded NUL characters.
    String(String),
    /// Raw bytes.
    Raw(Vec<u8>),
    /// Array of booleans.
    BooleanArray(Vec<bool>),
    /// Array of numbers.
    DoubleArray(Vec<f64>),
    /// Array of strings.
    StringArray(Vec<String>),
    /// Remote procedure definition.
    Rpc(Vec<u8>),
}

impl Value {
    /// Returns the type tag of this value.
    pub fn entry_type(&self) -> EntryType {
        match self {
            Value::Boolean(_) => EntryType::Boolean,
            Value::Double(_) => EntryType::Double,
            Value::String(_) => EntryType::String,
            Value::Raw(_) => EntryType::Raw,
            Value::BooleanArray(_) => EntryType::BooleanArray,
            Value::DoubleArray(_) => EntryType::DoubleArray,
            Value::StringArray(_) => EntryType::StringArray,
            Value::Rpc(_) => EntryType::Rpc,
        }
    }

    /// Number of bytes [`encode_value`](crate::encode_value) produces for
    /// this value, type tag included.
    pub fn encoded_len(&self) -> usize {
        fn bytes_len(len: usize) -> usize {
            uleb128_len(len as u64) + len
        }
        let payload = match self {
            Value::Boolean(_) => 1,
            Value::Double(_) => 8,
            Value::String(s) => bytes_len(s.len()),
            Value::Raw(b) | Value::Rpc(b) => bytes_len(b.len()),
            Value::BooleanArray(items) => bytes_len(items.len()),
            Value::DoubleArray(items) => uleb128_len(items.len() as u64) + 8 * items.len(),
            Value::StringArray(items) => {
                uleb128_len(items.len() as u64)
                    + items.iter().map(|s| bytes_len(s.len())).sum::<usize>()
            }
        };
        1 + payload
    }

    /// Checks the value against the decoder limits, so that anything that
    /// passes can be read back by a peer.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::SizeLimitExceeded`] for a byte string longer
    /// than [`MAX_BYTES_LENGTH`] or an array with more than
    /// [`MAX_ARRAY_ELEMENTS`] items.
    pub fn check_limits(&self) -> CodecResult<()> {
        fn check(claimed: usize, max_allowed: u64) -> CodecResult<()> {
            if claimed as u64 > max_allowed {
                return Err(CodecError::SizeLimitExceeded {
                    claimed: claimed as u64,
                    max_allowed,
                });
            }
            Ok(())
        }
        match self {
            Value::Boolean(_) | Value::Double(_) => Ok(()),
            Value::String(s) => check(s.len(), MAX_BYTES_LENGTH),
            Value::Raw(b) | Value::Rpc(b) => check(b.len(), MAX_BYTES_LENGTH),
            Value::BooleanArray(items) => check(items.len(), MAX_ARRAY_ELEMENTS),
            Value::DoubleArray(items) => check(items.len(), MAX_ARRAY_ELEMENTS),
            Value::StringArray(items) => {
                check(items.len(), MAX_ARRAY_ELEMENTS)?;
                items
                    .iter()
                    .try_for_each(|s| check(s.len(), MAX_BYTES_LENGTH))
            }
        }
    }

    /// Get this value as a boolean, if it is one.
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get this value as a number, if it is one.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this value as a string slice, if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get this value as raw bytes, if it is raw or an RPC definition.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Raw(b) | Value::Rpc(b) => Some(b),
            _ => None,
        }
    }

    /// Get this value as a boolean array.
    pub fn as_boolean_array(&self) -> Option<&[bool]> {
        match self {
            Value::BooleanArray(a) => Some(a),
            _ => None,
        }
    }

    /// Get this value as a number array.
    pub fn as_double_array(&self) -> Option<&[f64]> {
        match self {
            Value::DoubleArray(a) => Some(a),
            _ => None,
        }
    }

    /// Get this value as a string array.
    pub fn as_string_array(&self) -> Option<&[String]> {
        match self {
            Value::StringArray(a) => Some(a),
            _ => None,
        }
    }
}

// Doubles compare by bit pattern so that a decoded NaN equals the NaN that
// was encoded and storing the same NaN twice is recognized as "unchanged".
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Raw(a), Value::Raw(b)) => a == b,
            (Value::BooleanArray(a), Value::BooleanArray(b)) => a == b,
            (Value::DoubleArray(a), Value::DoubleArray(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
            }
            (Value::StringArray(a), Value::StringArray(b)) => a == b,
            (Value::Rpc(a), Value::Rpc(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Double(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Raw(b) => write!(f, "raw[{}]", b.len()),
            Value::BooleanArray(a) => write!(f, "{a:?}"),
            Value::DoubleArray(a) => write!(f, "{a:?}"),
            Value::StringArray(a) => write!(f, "{a:?}"),
            Value::Rpc(b) => write!(f, "rpc[{}]", b.len()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Double(f64::from(n))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Raw(b)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Raw(b.to_vec())
    }
}

impl From<Vec<bool>> for Value {
    fn from(v: Vec<bool>) -> Self {
        Value::BooleanArray(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::DoubleArray(v)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::StringArray(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_len_matches_encoder() {
        let values = [
            Value::Boolean(true),
            Value::Double(1.5),
            Value::String("x".repeat(200)),
            Value::Raw(vec![7; 130]),
            Value::BooleanArray(vec![true; 3]),
            Value::DoubleArray(vec![0.5; 129]),
            Value::StringArray(vec!["a".into(), String::new(), "ccc".into()]),
            Value::Rpc(Vec::new()),
        ];
        for value in &values {
            assert_eq!(value.encoded_len(), crate::encode_value(value).len(), "{value}");
        }
    }

    #[test]
    fn limits_match_decoder() {
        let at_limit = Value::BooleanArray(vec![true; MAX_ARRAY_ELEMENTS as usize]);
        assert!(at_limit.check_limits().is_ok());
        assert!(crate::decode_value(&crate::encode_value(&at_limit)).is_ok());

        let over = Value::BooleanArray(vec![true; MAX_ARRAY_ELEMENTS as usize + 1]);
        assert_eq!(
            over.check_limits(),
            Err(CodecError::SizeLimitExceeded {
                claimed: MAX_ARRAY_ELEMENTS + 1,
                max_allowed: MAX_ARRAY_ELEMENTS,
            })
        );

        let long = Value::StringArray(vec!["a".repeat(MAX_BYTES_LENGTH as usize + 1)]);
        assert!(long.check_limits().is_err());
    }

    #[test]
    fn type_codes_are_single_bits() {
        let all = [
            EntryType::Boolean,
            EntryType::Double,
            EntryType::String,
            EntryType::Raw,
            EntryType::BooleanArray,
            EntryType::DoubleArray,
            EntryType::StringArray,
            EntryType::Rpc,
        ];
        for ty in all {
            assert_eq!(ty.to_code().count_ones(), 1, "{ty}");
            assert_eq!(EntryType::from_code(ty.to_code()).unwrap(), ty);
        }
        assert_eq!(EntryType::from_code(0).unwrap(), EntryType::Unassigned);
    }

    #[test]
    fn unknown_type_codes_fail() {
        for code in [0x03u8, 0x05, 0x11, 0xff] {
            assert_eq!(
                EntryType::from_code(code),
                Err(CodecError::UnknownType { code })
            );
        }
    }

    #[test]
    fn type_mask() {
        let mask = EntryType::Boolean | EntryType::String;
        assert!(mask.matches(EntryType::Boolean));
        assert!(mask.matches(EntryType::String));
        assert!(!mask.matches(EntryType::Double));
        assert_eq!(mask.bits(), 0x05);

        assert!(EntryTypes::ANY.matches(EntryType::Rpc));
    }

    #[test]
    fn nan_equals_itself() {
        assert_eq!(Value::Double(f64::NAN), Value::Double(f64::NAN));
        assert_ne!(Value::Double(0.0), Value::Double(-0.0));
    }

    #[test]
    fn value_accessors() {
        assert_eq!(Value::Boolean(true).as_boolean(), Some(true));
        assert_eq!(Value::Double(1.5).as_boolean(), None);
        assert_eq!(Value::Double(1.5).as_double(), Some(1.5));
        assert_eq!(Value::from("hi").as_str(), Some("hi"));
        assert_eq!(Value::Rpc(vec![1]).as_bytes(), Some(&[1u8][..]));
        assert_eq!(Value::from(vec![true]).as_boolean_array(), Some(&[true][..]));
    }

    #[test]
    fn variant_carries_type() {
        assert_eq!(Value::from(1.0).entry_type(), EntryType::Double);
        assert_eq!(Value::from(vec![1.0, 2.0]).entry_type(), EntryType::DoubleArray);
        assert_eq!(
            Value::from(vec!["a".to_string()]).entry_type(),
            EntryType::StringArray
        );
    }
}
