//! Server configuration.

use nettable_sync_protocol::DEFAULT_PORT;
use std::net::SocketAddr;
use std::time::Duration;

/// Configuration for the table server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to. Port 0 picks a free port.
    pub bind_addr: SocketAddr,
    /// Identity announced in the server hello.
    pub identity: String,
    /// Maximum concurrent peers.
    pub max_connections: usize,
    /// Upper bound on a peer's handshake.
    pub handshake_timeout: Duration,
    /// Upper bound on a single write to a peer.
    pub write_timeout: Duration,
    /// Idle time after which a keep-alive is sent to a peer.
    pub keep_alive_interval: Duration,
    /// Decode errors tolerated from one peer within `protocol_error_window`.
    pub max_protocol_errors: usize,
    /// Window over which decode errors are counted.
    pub protocol_error_window: Duration,
}

impl ServerConfig {
    /// Creates a new server configuration.
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            identity: "nettable-server".into(),
            max_connections: 64,
            handshake_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(1),
            keep_alive_interval: Duration::from_secs(1),
            max_protocol_errors: 3,
            protocol_error_window: Duration::from_secs(1),
        }
    }

    /// Configuration bound to an ephemeral loopback port.
    pub fn ephemeral() -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], 0)))
    }

    /// Sets the identity.
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    /// Sets the maximum concurrent peers.
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the handshake timeout.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Sets the write timeout.
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)))
    }
}
