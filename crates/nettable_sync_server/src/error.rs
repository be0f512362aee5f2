//! Error types for the table server.

use nettable_codec::CodecError;
use nettable_core::CoreError;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the table server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A peer sent a frame that could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] CodecError),

    /// The peer limit is reached.
    #[error("too many connections (limit {limit})")]
    TooManyConnections {
        /// Configured limit.
        limit: usize,
    },

    /// A peer broke the handshake sequence.
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),

    /// A peer speaks another protocol version.
    #[error("unsupported protocol version {version:#06x}")]
    UnsupportedVersion {
        /// Version requested by the peer.
        version: u16,
    },

    /// A read or write took too long.
    #[error("operation timed out")]
    Timeout,

    /// Store error.
    #[error("store error: {0}")]
    Core(#[from] CoreError),
}

impl ServerError {
    /// Returns true if the error was caused by the peer rather than the
    /// server.
    pub fn is_peer_error(&self) -> bool {
        matches!(
            self,
            ServerError::Protocol(_)
                | ServerError::HandshakeFailed(_)
                | ServerError::UnsupportedVersion { .. }
        )
    }
}

impl From<tokio::time::error::Elapsed> for ServerError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        ServerError::Timeout
    }
}
