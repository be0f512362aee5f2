//! Error types for NetTable core.

use nettable_codec::{CodecError, EntryType};
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in entry store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A put tried to change the type of an existing entry without force.
    #[error("type conflict on {key}: entry is {existing}, attempted {attempted}")]
    TypeConflict {
        /// Normalized key of the entry.
        key: String,
        /// Type currently stored.
        existing: EntryType,
        /// Type of the rejected value.
        attempted: EntryType,
    },

    /// The key is empty.
    #[error("invalid key: keys must not be empty")]
    InvalidKey,

    /// The value could not be decoded by a peer, or would not fit in a
    /// single frame together with its key.
    #[error("value for {key} is too large: {source}")]
    ValueTooLarge {
        /// Normalized key of the rejected write.
        key: String,
        /// The limit that was exceeded.
        source: CodecError,
    },
}
