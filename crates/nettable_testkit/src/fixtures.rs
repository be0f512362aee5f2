//! Loopback fixtures.
//!
//! A server on an ephemeral port and clients tuned for fast tests: short
//! update rate, short retry delays, no jitter.

use nettable_sync_engine::{ClientConfig, NetworkTable, RetryConfig};
use nettable_sync_server::{ServerConfig, TableServer};
use std::net::SocketAddr;
use std::thread;
use std::time::{Duration, Instant};

/// How long fixtures wait for a condition before giving up.
pub const DEFAULT_WAIT: Duration = Duration::from_secs(5);

/// Starts a server on `127.0.0.1:0`.
pub fn start_server() -> TableServer {
    TableServer::start(ServerConfig::ephemeral()).expect("Failed to start server")
}

/// Starts a server on a specific address, retrying while the port is
/// still held by a previous server.
pub fn start_server_at(addr: SocketAddr) -> TableServer {
    let deadline = Instant::now() + DEFAULT_WAIT;
    loop {
        match TableServer::start(ServerConfig::new(addr)) {
            Ok(server) => return server,
            Err(_) if Instant::now() < deadline => thread::sleep(Duration::from_millis(20)),
            Err(err) => panic!("Failed to start server at {addr}: {err}"),
        }
    }
}

/// Client configuration for tests.
pub fn fast_client_config(identity: &str) -> ClientConfig {
    ClientConfig::new(identity)
        .with_update_rate(0.01)
        .with_connect_timeout(Duration::from_millis(500))
        .with_handshake_timeout(Duration::from_secs(2))
        .with_retry(
            RetryConfig::new()
                .with_initial_delay(Duration::from_millis(20))
                .with_max_delay(Duration::from_millis(200))
                .with_jitter(false),
        )
}

/// Creates a client and starts connecting it to `server`.
pub fn client_for(server: &TableServer, identity: &str) -> NetworkTable {
    let client = NetworkTable::new(fast_client_config(identity));
    let addr = server.local_addr();
    client
        .connect(&addr.ip().to_string(), addr.port())
        .expect("Failed to start client");
    client
}

/// Creates a client and waits until its handshake has completed.
pub fn connected_client(server: &TableServer, identity: &str) -> NetworkTable {
    let client = client_for(server, identity);
    assert!(
        wait_for(DEFAULT_WAIT, || client.is_connected()),
        "client {identity} did not connect"
    );
    client
}

/// Polls `condition` until it holds or `timeout` elapses.
///
/// Returns whether the condition held.
pub fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(5));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_for_times_out() {
        let start = Instant::now();
        assert!(!wait_for(Duration::from_millis(30), || false));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn wait_for_sees_condition() {
        let mut calls = 0;
        assert!(wait_for(DEFAULT_WAIT, || {
            calls += 1;
            calls == 3
        }));
    }

    #[test]
    fn fixture_client_connects() {
        let server = start_server();
        let client = connected_client(&server, "fixture");
        assert!(wait_for(DEFAULT_WAIT, || server.peer_count() == 1));
        client.disconnect();
        assert!(wait_for(DEFAULT_WAIT, || server.peer_count() == 0));
    }
}
