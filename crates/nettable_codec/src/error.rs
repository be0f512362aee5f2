//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during encoding or decoding.
///
/// Every decoding error is a protocol error: the peer sent bytes that do not
/// describe a valid value or frame. None of them are fatal to the process;
/// callers log the error and drop the offending frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Unexpected end of input.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// Type tag that does not name any entry type.
    #[error("unknown entry type tag 0x{code:02x}")]
    UnknownType {
        /// The unrecognized tag byte.
        code: u8,
    },

    /// Message type byte that does not name any protocol message.
    #[error("unknown message type 0x{code:02x}")]
    UnknownMessage {
        /// The unrecognized message byte.
        code: u8,
    },

    /// Invalid UTF-8 string.
    #[error("invalid UTF-8 string")]
    InvalidUtf8,

    /// Boolean byte other than 0 or 1.
    #[error("invalid boolean byte 0x{byte:02x}")]
    InvalidBoolean {
        /// The offending byte.
        byte: u8,
    },

    /// A length or count exceeds the decoder limits.
    #[error("size limit exceeded: claimed {claimed}, max allowed {max_allowed}")]
    SizeLimitExceeded {
        /// The length claimed by the input.
        claimed: u64,
        /// The maximum the decoder accepts.
        max_allowed: u64,
    },

    /// Structurally invalid input.
    #[error("invalid structure: {message}")]
    InvalidStructure {
        /// Description of the structural error.
        message: String,
    },
}

impl CodecError {
    /// Create an invalid structure error.
    pub fn invalid_structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure {
            message: message.into(),
        }
    }
}
