//! Protocol messages.

use crate::sequence::SequenceNumber;
use crate::PROTOCOL_VERSION;
use nettable_codec::{CodecError, CodecResult, Decode, Encode, Value, WireDecoder, WireEncoder};

/// Magic value carried by [`Message::ClearEntries`] so a stray byte cannot
/// wipe a table.
pub const CLEAR_ALL_MAGIC: u32 = 0xD06C_B27A;

/// A protocol message.
///
/// Handshake messages flow in a fixed order:
///
/// ```text
/// client                               server
///   │── ClientHello(version, id) ────────▶│
///   │◀──────────────── ServerHello(flags) ─│
///   │◀──────────────── EntryAssign × N ────│
///   │◀──────────────── ServerHelloDone ────│
///   │── EntryAssign × M (client-only) ────▶│
///   │── ClientHelloDone ──────────────────▶│
/// ```
///
/// After the handshake either side may send entry messages at any time.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Keeps an idle connection from timing out.
    KeepAlive,
    /// First message from a client.
    ClientHello {
        /// Protocol version the client speaks.
        protocol_version: u16,
        /// Identity string of the client.
        identity: String,
    },
    /// Server refusal of the client's protocol version.
    ProtocolUnsupported {
        /// Version the server supports.
        supported_version: u16,
    },
    /// End of the server's initial entry list.
    ServerHelloDone,
    /// Server acceptance of the client hello.
    ServerHello {
        /// Server flags (bit 0: the server has seen this identity before).
        flags: u8,
        /// Identity string of the server.
        identity: String,
    },
    /// End of the client's initial entry list.
    ClientHelloDone,
    /// Creates an entry, or replaces one whose type differs.
    EntryAssign {
        /// Normalized entry key.
        key: String,
        /// Sequence number of the assignment.
        seq: SequenceNumber,
        /// Entry flags.
        flags: u8,
        /// Entry value.
        value: Value,
    },
    /// New value for an existing entry of the same type.
    EntryUpdate {
        /// Normalized entry key.
        key: String,
        /// Sequence number of the update.
        seq: SequenceNumber,
        /// New value.
        value: Value,
    },
    /// New flags for an existing entry.
    FlagsUpdate {
        /// Normalized entry key.
        key: String,
        /// New flags.
        flags: u8,
    },
    /// Removes an entry.
    EntryDelete {
        /// Normalized entry key.
        key: String,
    },
    /// Removes every non-persistent entry.
    ClearEntries {
        /// Must equal [`CLEAR_ALL_MAGIC`].
        magic: u32,
    },
}

impl Message {
    /// Returns the message type code.
    pub fn type_code(&self) -> u8 {
        match self {
            Message::KeepAlive => 0x00,
            Message::ClientHello { .. } => 0x01,
            Message::ProtocolUnsupported { .. } => 0x02,
            Message::ServerHelloDone => 0x03,
            Message::ServerHello { .. } => 0x04,
            Message::ClientHelloDone => 0x05,
            Message::EntryAssign { .. } => 0x10,
            Message::EntryUpdate { .. } => 0x11,
            Message::FlagsUpdate { .. } => 0x12,
            Message::EntryDelete { .. } => 0x13,
            Message::ClearEntries { .. } => 0x14,
        }
    }

    /// Creates a client hello for the current protocol version.
    pub fn client_hello(identity: impl Into<String>) -> Self {
        Message::ClientHello {
            protocol_version: PROTOCOL_VERSION,
            identity: identity.into(),
        }
    }

    /// Creates a clear-all message carrying the magic value.
    pub fn clear_entries() -> Self {
        Message::ClearEntries {
            magic: CLEAR_ALL_MAGIC,
        }
    }

    /// Returns the entry key this message targets, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            Message::EntryAssign { key, .. }
            | Message::EntryUpdate { key, .. }
            | Message::FlagsUpdate { key, .. }
            | Message::EntryDelete { key } => Some(key),
            _ => None,
        }
    }

    /// Returns true for messages that only appear during the handshake.
    pub fn is_handshake(&self) -> bool {
        matches!(
            self,
            Message::ClientHello { .. }
                | Message::ProtocolUnsupported { .. }
                | Message::ServerHello { .. }
                | Message::ServerHelloDone
                | Message::ClientHelloDone
        )
    }
}

impl Encode for Message {
    fn encode_to(&self, encoder: &mut WireEncoder) {
        encoder.write_u8(self.type_code());
        match self {
            Message::KeepAlive | Message::ServerHelloDone | Message::ClientHelloDone => {}
            Message::ClientHello {
                protocol_version,
                identity,
            } => {
                encoder.write_u16(*protocol_version);
                encoder.write_string(identity);
            }
            Message::ProtocolUnsupported { supported_version } => {
                encoder.write_u16(*supported_version);
            }
            Message::ServerHello { flags, identity } => {
                encoder.write_u8(*flags);
                encoder.write_string(identity);
            }
            Message::EntryAssign {
                key,
                seq,
                flags,
                value,
            } => {
                encoder.write_string(key);
                encoder.write_u16(seq.value());
                encoder.write_u8(*flags);
                encoder.write_value(value);
            }
            Message::EntryUpdate { key, seq, value } => {
                encoder.write_string(key);
                encoder.write_u16(seq.value());
                encoder.write_value(value);
            }
            Message::FlagsUpdate { key, flags } => {
                encoder.write_string(key);
                encoder.write_u8(*flags);
            }
            Message::EntryDelete { key } => {
                encoder.write_string(key);
            }
            Message::ClearEntries { magic } => {
                encoder.write_u32(*magic);
            }
        }
    }
}

impl Decode for Message {
    fn decode_from(decoder: &mut WireDecoder<'_>) -> CodecResult<Self> {
        let code = decoder.read_u8()?;
        let message = match code {
            0x00 => Message::KeepAlive,
            0x01 => Message::ClientHello {
                protocol_version: decoder.read_u16()?,
                identity: decoder.read_string()?,
            },
            0x02 => Message::ProtocolUnsupported {
                supported_version: decoder.read_u16()?,
            },
            0x03 => Message::ServerHelloDone,
            0x04 => Message::ServerHello {
                flags: decoder.read_u8()?,
                identity: decoder.read_string()?,
            },
            0x05 => Message::ClientHelloDone,
            0x10 => Message::EntryAssign {
                key: decoder.read_string()?,
                seq: SequenceNumber::new(decoder.read_u16()?),
                flags: decoder.read_u8()?,
                value: decoder.read_value()?,
            },
            0x11 => Message::EntryUpdate {
                key: decoder.read_string()?,
                seq: SequenceNumber::new(decoder.read_u16()?),
                value: decoder.read_value()?,
            },
            0x12 => Message::FlagsUpdate {
                key: decoder.read_string()?,
                flags: decoder.read_u8()?,
            },
            0x13 => Message::EntryDelete {
                key: decoder.read_string()?,
            },
            0x14 => {
                let magic = decoder.read_u32()?;
                if magic != CLEAR_ALL_MAGIC {
                    return Err(CodecError::invalid_structure(format!(
                        "clear-entries magic mismatch: 0x{magic:08x}"
                    )));
                }
                Message::ClearEntries { magic }
            }
            _ => return Err(CodecError::UnknownMessage { code }),
        };
        Ok(message)
    }
}
