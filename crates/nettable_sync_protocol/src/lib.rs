//! # NetTable Sync Protocol
//!
//! Protocol messages and framing for NetTable.
//!
//! This crate provides:
//! - `Message` for the handshake and entry messages
//! - `SequenceNumber` for conflict resolution between peers
//! - Length-delimited framing over a byte stream
//! - `ErrorWindow` for the protocol error policy
//!
//! The crate itself performs no I/O. The `io` feature adds `FrameReader`
//! and `FrameWriter` for tokio byte streams.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error_window;
mod frame;
#[cfg(feature = "io")]
mod io;
mod messages;
mod sequence;

pub use error_window::ErrorWindow;
pub use frame::{
    decode_payload, encode_frame, encode_frames, entry_frame_len, FrameDecoder, FRAME_HEADER_LEN,
    MAX_FRAME_LEN,
};
#[cfg(feature = "io")]
pub use io::{FrameReader, FrameWriter};
pub use messages::{Message, CLEAR_ALL_MAGIC};
pub use sequence::SequenceNumber;

/// Protocol version spoken by this implementation (major 3, minor 0).
pub const PROTOCOL_VERSION: u16 = 0x0300;

/// Default TCP port of a table server.
pub const DEFAULT_PORT: u16 = 1735;

/// `ServerHello` flag: the server has seen this client identity before.
pub const SERVER_HELLO_REPEAT_CLIENT: u8 = 0x01;

#[cfg(test)]
mod tests {
    use super::*;
    use nettable_codec::{Decode, Encode, Value};
    use proptest::prelude::*;

    fn message_strategy() -> impl Strategy<Value = Message> {
        let key = "/[a-z]{1,8}";
        prop_oneof![
            Just(Message::KeepAlive),
            Just(Message::ServerHelloDone),
            Just(Message::ClientHelloDone),
            Just(Message::clear_entries()),
            (any::<u16>(), ".{0,16}").prop_map(|(protocol_version, identity)| {
                Message::ClientHello {
                    protocol_version,
                    identity,
                }
            }),
            any::<u16>().prop_map(|supported_version| Message::ProtocolUnsupported {
                supported_version
            }),
            (key, any::<u16>(), any::<u8>(), any::<f64>()).prop_map(|(key, seq, flags, d)| {
                Message::EntryAssign {
                    key,
                    seq: SequenceNumber::new(seq),
                    flags,
                    value: Value::Double(d),
                }
            }),
            (key, any::<u16>(), ".{0,16}").prop_map(|(key, seq, s)| Message::EntryUpdate {
                key,
                seq: SequenceNumber::new(seq),
                value: Value::String(s),
            }),
            (key, any::<u8>()).prop_map(|(key, flags)| Message::FlagsUpdate { key, flags }),
            key.prop_map(|key| Message::EntryDelete { key }),
        ]
    }

    proptest! {
        #[test]
        fn message_roundtrip(message in message_strategy()) {
            let bytes = message.encode();
            prop_assert_eq!(Message::decode(&bytes).unwrap(), message);
        }

        #[test]
        fn arbitrary_payload_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
            let _ = decode_payload(&bytes);
        }
    }

    #[test]
    fn version_constant() {
        assert_eq!(PROTOCOL_VERSION >> 8, 3);
        assert_eq!(DEFAULT_PORT, 1735);
    }
}
