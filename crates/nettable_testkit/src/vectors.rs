//! Wire test vectors.
//!
//! Byte sequences with their expected decoding outcome, shared with
//! implementations in other languages as JSON.

use serde::{Deserialize, Serialize};

/// A wire test vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireVector {
    /// Unique identifier for this vector.
    pub id: String,
    /// Human-readable description.
    pub description: String,
    /// Encoded bytes (hex).
    pub hex: String,
    /// Name of the expected `CodecError` variant, if decoding must fail.
    pub expected_error: Option<String>,
}

fn valid(id: &str, description: &str, hex: &str) -> WireVector {
    WireVector {
        id: id.into(),
        description: description.into(),
        hex: hex.into(),
        expected_error: None,
    }
}

fn invalid(id: &str, description: &str, hex: &str, error: &str) -> WireVector {
    WireVector {
        id: id.into(),
        description: description.into(),
        hex: hex.into(),
        expected_error: Some(error.into()),
    }
}

/// Value encoding vectors (type tag plus payload).
pub fn value_vectors() -> Vec<WireVector> {
    vec![
        valid("bool_true", "boolean true", "01 01"),
        valid("bool_false", "boolean false", "01 00"),
        valid("double_one", "double 1.0", "02 3ff0000000000000"),
        valid("double_neg", "double -2.5", "02 c004000000000000"),
        valid("string_hi", "string \"hi\"", "04 02 6869"),
        valid("string_empty", "empty string", "04 00"),
        valid("string_nul", "string with embedded NUL", "04 03 610062"),
        valid("raw", "raw bytes de ad", "08 02 dead"),
        valid("bool_array", "boolean array [true, false]", "10 02 01 00"),
        valid("double_array", "double array [0.5]", "20 01 3fe0000000000000"),
        valid("string_array", "string array [a, bc]", "40 02 01 61 02 6263"),
        valid("rpc", "rpc definition 01", "80 01 01"),
        invalid("bool_two", "boolean byte 2", "01 02", "InvalidBoolean"),
        invalid("tag_0x03", "tag that names no type", "03 00", "UnknownType"),
        invalid("string_short", "string shorter than its length", "04 05 6869", "UnexpectedEof"),
        invalid("string_utf8", "string with invalid UTF-8", "04 02 fffe", "InvalidUtf8"),
        invalid("empty", "no bytes at all", "", "UnexpectedEof"),
        invalid(
            "array_huge",
            "array count above the limit",
            "10 ffffffff0f",
            "SizeLimitExceeded",
        ),
    ]
}

/// Message payload vectors (message type plus fields, no frame header).
pub fn message_vectors() -> Vec<WireVector> {
    vec![
        valid("keep_alive", "keep alive", "00"),
        valid("client_hello", "client hello 3.0 \"ab\"", "01 0300 02 6162"),
        valid("protocol_unsupported", "server supports 3.0", "02 0300"),
        valid("server_hello_done", "server hello done", "03"),
        valid("server_hello", "repeat client, \"srv\"", "04 01 03 737276"),
        valid("client_hello_done", "client hello done", "05"),
        valid(
            "entry_assign",
            "assign /x seq 0 flags 0 true",
            "10 02 2f78 0000 00 01 01",
        ),
        valid(
            "entry_update",
            "update /x seq 1 double 1.0",
            "11 02 2f78 0001 02 3ff0000000000000",
        ),
        valid("flags_update", "flags /x persistent", "12 02 2f78 01"),
        valid("entry_delete", "delete /x", "13 02 2f78"),
        valid("clear_entries", "clear all with magic", "14 d06cb27a"),
        invalid("clear_bad_magic", "clear all without magic", "14 00000001", "InvalidStructure"),
        invalid("unknown_message", "message type 0x42", "42", "UnknownMessage"),
        invalid("trailing", "keep alive with trailing byte", "00 00", "InvalidStructure"),
    ]
}

/// All vectors as pretty-printed JSON.
pub fn all_vectors_json() -> String {
    let vectors = serde_json::json!({
        "values": value_vectors(),
        "messages": message_vectors(),
    });
    serde_json::to_string_pretty(&vectors).expect("Failed to serialize vectors")
}

/// Encodes bytes as lowercase hex.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Decodes hex, ignoring whitespace.
pub fn hex_decode(hex: &str) -> Vec<u8> {
    let hex = hex.replace([' ', '\n', '\r'], "");
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).expect("Invalid hex"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nettable_codec::{CodecError, Decode, Encode, Value};
    use nettable_sync_protocol::Message;

    fn check<T: Decode + Encode + std::fmt::Debug>(vector: &WireVector) {
        let bytes = hex_decode(&vector.hex);
        let result = T::decode(&bytes);
        match (&vector.expected_error, result) {
            (None, Ok(decoded)) => {
                assert_eq!(decoded.encode(), bytes, "{}: re-encoding differs", vector.id);
            }
            (Some(expected), Err(err)) => {
                let name = format!("{err:?}");
                assert!(
                    name.starts_with(expected.as_str()),
                    "{}: expected {expected}, got {name}",
                    vector.id
                );
            }
            (None, Err(err)) => panic!("{}: unexpected error {err:?}", vector.id),
            (Some(expected), Ok(decoded)) => {
                panic!("{}: expected {expected}, decoded {decoded:?}", vector.id)
            }
        }
    }

    #[test]
    fn value_vectors_decode() {
        for vector in value_vectors() {
            check::<Value>(&vector);
        }
    }

    #[test]
    fn message_vectors_decode() {
        for vector in message_vectors() {
            check::<Message>(&vector);
        }
    }

    #[test]
    fn selected_values() {
        let bytes = hex_decode("02 c004000000000000");
        assert_eq!(Value::decode(&bytes).unwrap(), Value::Double(-2.5));
        let bytes = hex_decode("04 03 610062");
        assert_eq!(Value::decode(&bytes).unwrap(), Value::String("a\0b".into()));
        assert_eq!(
            Value::decode(&hex_decode("01 02")),
            Err(CodecError::InvalidBoolean { byte: 2 })
        );
    }

    #[test]
    fn json_roundtrip() {
        let json = all_vectors_json();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        let values: Vec<WireVector> = serde_json::from_value(parsed["values"].clone()).unwrap();
        assert_eq!(values.len(), value_vectors().len());
    }

    #[test]
    fn hex_roundtrip() {
        let bytes = vec![0x00, 0x7f, 0xff];
        assert_eq!(hex_decode(&hex_encode(&bytes)), bytes);
    }
}
