//! Connection state.

use std::fmt;

/// State of the client's connection to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No connection and none being attempted.
    #[default]
    Disconnected,
    /// Connecting or handshaking.
    Connecting,
    /// Handshake complete.
    Connected,
}

impl ConnectionState {
    /// Returns true once the handshake has completed.
    pub fn is_connected(self) -> bool {
        self == ConnectionState::Connected
    }

    /// Returns true while a connection exists or is being set up.
    pub fn is_active(self) -> bool {
        self != ConnectionState::Disconnected
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_predicates() {
        assert!(!ConnectionState::Disconnected.is_active());
        assert!(ConnectionState::Connecting.is_active());
        assert!(!ConnectionState::Connecting.is_connected());
        assert!(ConnectionState::Connected.is_connected());
        assert_eq!(ConnectionState::Connected.to_string(), "connected");
    }
}
