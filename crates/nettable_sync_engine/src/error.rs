//! Error types for the sync engine.

use nettable_codec::CodecError;
use nettable_core::CoreError;
use std::io;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while talking to a server.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The connection was closed or reset.
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// A frame could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] CodecError),

    /// The server does not speak our protocol version.
    #[error("protocol version mismatch: local={local:#06x}, remote={remote:#06x}")]
    VersionMismatch {
        /// Local protocol version.
        local: u16,
        /// Version supported by the server.
        remote: u16,
    },

    /// The server broke the handshake sequence.
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),

    /// Timeout.
    #[error("operation timed out")]
    Timeout,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Local store error.
    #[error("store error: {0}")]
    Core(#[from] CoreError),
}

impl SyncError {
    /// Returns true if reconnecting may succeed without outside changes.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::ConnectionLost(_)
            | SyncError::Protocol(_)
            | SyncError::HandshakeFailed(_)
            | SyncError::Timeout
            | SyncError::Io(_) => true,
            SyncError::VersionMismatch { .. } | SyncError::Core(_) => false,
        }
    }
}

impl From<tokio::time::error::Elapsed> for SyncError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        SyncError::Timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(SyncError::ConnectionLost("reset".into()).is_retryable());
        assert!(SyncError::Timeout.is_retryable());
        assert!(SyncError::Protocol(CodecError::UnexpectedEof).is_retryable());
        assert!(!SyncError::VersionMismatch {
            local: 0x0300,
            remote: 0x0200
        }
        .is_retryable());
        assert!(!SyncError::Core(CoreError::InvalidKey).is_retryable());
    }

    #[test]
    fn error_display() {
        let err = SyncError::VersionMismatch {
            local: 0x0300,
            remote: 0x0200,
        };
        assert_eq!(
            err.to_string(),
            "protocol version mismatch: local=0x0300, remote=0x0200"
        );
    }
}
