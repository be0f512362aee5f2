//! Server lifecycle and local table access.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::{messages_for, serve_peer, ServerContext};
use nettable_codec::Value;
use nettable_core::{ConnectionInfo, CoreResult, Entries, EntryFlags};
use nettable_sync_protocol::Message;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::net::TcpListener;
use tokio::sync::watch;

/// A running table server.
///
/// The server owns the authoritative copy of the table. Every accepted
/// write is forwarded to all other peers; a write that loses on sequence
/// number is answered with the current value.
///
/// Networking runs on a dedicated thread, so the handle can be used from
/// synchronous code. Dropping the handle shuts the server down.
pub struct TableServer {
    ctx: Arc<ServerContext>,
    local_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    thread: Option<JoinHandle<()>>,
}

impl TableServer {
    /// Binds the listening socket and starts accepting peers.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound or the network
    /// thread cannot be started.
    pub fn start(config: ServerConfig) -> ServerResult<Self> {
        let listener = std::net::TcpListener::bind(config.bind_addr)?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        let ctx = Arc::new(ServerContext::new(config));
        let (shutdown, shutdown_rx) = watch::channel(false);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let thread_ctx = Arc::clone(&ctx);
        let thread = thread::Builder::new()
            .name("nettable-server".into())
            .spawn(move || {
                runtime.block_on(async move {
                    match TcpListener::from_std(listener) {
                        Ok(listener) => accept_loop(thread_ctx, listener, shutdown_rx).await,
                        Err(err) => tracing::error!(error = %err, "failed to register listener"),
                    }
                });
            })?;

        tracing::info!(addr = %local_addr, "table server listening");
        Ok(Self {
            ctx,
            local_addr,
            shutdown,
            thread: Some(thread),
        })
    }

    /// Returns the bound address (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns the configuration the server was started with.
    pub fn config(&self) -> &ServerConfig {
        &self.ctx.config
    }

    /// Number of peers past the handshake.
    pub fn peer_count(&self) -> usize {
        self.ctx.peer_count()
    }

    /// Descriptions of the connected peers.
    pub fn peers(&self) -> Vec<ConnectionInfo> {
        self.ctx.peers()
    }

    /// Returns the value under `key`.
    pub fn get_value(&self, key: &str) -> Option<Value> {
        self.ctx.store.get_value(key)
    }

    /// Writes a value and forwards it to every peer.
    ///
    /// # Errors
    ///
    /// Fails on an empty key, or on a type change without `force`.
    pub fn put_value(&self, key: &str, value: Value, force: bool) -> CoreResult<()> {
        self.ctx.commit(|store| match store.put(key, value, force) {
            Ok(changes) => (Ok(()), messages_for(&changes)),
            Err(err) => (Err(err), Vec::new()),
        })
    }

    /// Deletes an entry and forwards the delete to every peer.
    pub fn delete(&self, key: &str) {
        self.ctx.commit(|store| ((), messages_for(&store.delete(key))));
    }

    /// Deletes every non-persistent entry on the server and all peers.
    pub fn delete_all(&self) {
        self.ctx.commit(|store| {
            store.delete_all();
            ((), vec![Message::clear_entries()])
        });
    }

    /// Replaces the flags of an entry and forwards them to every peer.
    ///
    /// # Errors
    ///
    /// Fails on an empty key.
    pub fn set_flags(&self, key: &str, flags: EntryFlags) -> CoreResult<()> {
        self.ctx.commit(|store| match store.set_flags(key, flags) {
            Ok(changes) => (Ok(()), messages_for(&changes)),
            Err(err) => (Err(err), Vec::new()),
        })
    }

    /// Snapshot of the entries under `prefix`.
    pub fn entries(&self, prefix: &str) -> Entries {
        self.ctx.store.list(prefix)
    }

    /// Number of entries in the table.
    pub fn entry_count(&self) -> usize {
        self.ctx.store.len()
    }

    /// Stops accepting, closes every peer and joins the network thread.
    /// Idempotent.
    pub fn shutdown(&mut self) {
        let _ = self.shutdown.send(true);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("server thread panicked");
            }
            tracing::info!(addr = %self.local_addr, "table server stopped");
        }
    }
}

impl Drop for TableServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for TableServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableServer")
            .field("local_addr", &self.local_addr)
            .field("peers", &self.peer_count())
            .field("entries", &self.entry_count())
            .finish()
    }
}

async fn accept_loop(
    ctx: Arc<ServerContext>,
    listener: TcpListener,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut sessions = tokio::task::JoinSet::new();
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            accepted = listener.accept() => {
                let (stream, addr) = match accepted {
                    Ok(accepted) => accepted,
                    Err(err) => {
                        tracing::warn!(error = %err, "accept failed");
                        continue;
                    }
                };
                let limit = ctx.config.max_connections;
                if sessions.len() >= limit {
                    let err = ServerError::TooManyConnections { limit };
                    tracing::warn!(addr = %addr, error = %err, "rejecting peer");
                    drop(stream);
                    continue;
                }
                if let Err(err) = stream.set_nodelay(true) {
                    tracing::debug!(addr = %addr, error = %err, "set_nodelay failed");
                }

                let ctx = Arc::clone(&ctx);
                let mut shutdown = shutdown.clone();
                sessions.spawn(async move {
                    let (read, write) = stream.into_split();
                    match serve_peer(&ctx, read, write, addr, &mut shutdown).await {
                        Ok(()) => {}
                        Err(err) if err.is_peer_error() => {
                            tracing::debug!(addr = %addr, error = %err, "peer session rejected");
                        }
                        Err(err) => tracing::warn!(addr = %addr, error = %err, "peer session failed"),
                    }
                });
            }
            Some(_) = sessions.join_next(), if !sessions.is_empty() => {}
        }
    }

    // Connected sessions close on the same signal; anything still
    // handshaking after the write timeout is aborted.
    let drain = async { while sessions.join_next().await.is_some() {} };
    let _ = tokio::time::timeout(ctx.config.write_timeout, drain).await;
    sessions.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_on_ephemeral_port() {
        let mut server = TableServer::start(ServerConfig::ephemeral()).unwrap();
        assert_ne!(server.local_addr().port(), 0);
        assert_eq!(server.peer_count(), 0);
        server.shutdown();
        server.shutdown();
    }

    #[test]
    fn local_writes() {
        let server = TableServer::start(ServerConfig::ephemeral()).unwrap();
        server.put_value("x", Value::Double(1.0), false).unwrap();
        assert_eq!(server.get_value("/x"), Some(Value::Double(1.0)));
        assert!(server
            .put_value("/x", Value::Boolean(true), false)
            .is_err());
        server.put_value("/x", Value::Boolean(true), true).unwrap();
        assert_eq!(server.get_value("/x"), Some(Value::Boolean(true)));

        server.set_flags("/x", EntryFlags::PERSISTENT).unwrap();
        server.put_value("/y", Value::String("s".into()), false).unwrap();
        assert_eq!(server.entry_count(), 2);

        server.delete_all();
        assert_eq!(server.entry_count(), 1);
        server.delete("/x");
        assert_eq!(server.entry_count(), 0);
        assert_eq!(server.entries("").count(), 0);
    }

    #[test]
    fn bind_conflict_is_io_error() {
        let server = TableServer::start(ServerConfig::ephemeral()).unwrap();
        let taken = ServerConfig::new(server.local_addr());
        assert!(matches!(TableServer::start(taken), Err(ServerError::Io(_))));
    }
}
