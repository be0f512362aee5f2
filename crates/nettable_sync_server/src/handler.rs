//! Per-peer session handling and fan-out.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use nettable_core::{
    now_micros, Change, ConnectionInfo, Entry, EntryFlags, EntryStore, RemoteApply,
};
use nettable_sync_protocol::{
    decode_payload, ErrorWindow, FrameReader, FrameWriter, Message, PROTOCOL_VERSION,
    SERVER_HELLO_REPEAT_CLIENT,
};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, timeout, MissedTickBehavior};

pub(crate) type PeerId = u64;

struct PeerHandle {
    identity: String,
    addr: SocketAddr,
    connected_at: u64,
    tx: mpsc::UnboundedSender<Vec<Message>>,
}

struct Registry {
    peers: BTreeMap<PeerId, PeerHandle>,
    seen: HashSet<String>,
}

/// State shared by every session of one server.
pub(crate) struct ServerContext {
    pub(crate) config: ServerConfig,
    pub(crate) store: EntryStore,
    registry: Mutex<Registry>,
    next_id: AtomicU64,
}

impl ServerContext {
    pub(crate) fn new(config: ServerConfig) -> Self {
        Self {
            config,
            store: EntryStore::authoritative(),
            registry: Mutex::new(Registry {
                peers: BTreeMap::new(),
                seen: HashSet::new(),
            }),
            next_id: AtomicU64::new(1),
        }
    }

    pub(crate) fn peer_count(&self) -> usize {
        self.registry.lock().peers.len()
    }

    pub(crate) fn peers(&self) -> Vec<ConnectionInfo> {
        self.registry
            .lock()
            .peers
            .values()
            .map(|peer| ConnectionInfo {
                remote_id: peer.identity.clone(),
                remote_ip: peer.addr.ip().to_string(),
                remote_port: peer.addr.port(),
                last_update: peer.connected_at,
                protocol_version: PROTOCOL_VERSION,
            })
            .collect()
    }

    /// Applies a local mutation and fans its changes out to every peer.
    ///
    /// The registry lock is held across the store write and the fan-out,
    /// so every peer sees changes in the order the store accepted them.
    pub(crate) fn commit<T>(&self, mutate: impl FnOnce(&EntryStore) -> (T, Vec<Message>)) -> T {
        let registry = self.registry.lock();
        let (result, messages) = mutate(&self.store);
        fan_out(&registry, None, messages);
        result
    }

    /// Registers a peer and snapshots the store in one step.
    ///
    /// Returns the peer id, whether the identity connected before, the
    /// snapshot and the receiver for later fan-out.
    fn register(
        &self,
        identity: &str,
        addr: SocketAddr,
    ) -> (PeerId, bool, Vec<Entry>, mpsc::UnboundedReceiver<Vec<Message>>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        let mut registry = self.registry.lock();
        let repeat = !registry.seen.insert(identity.to_string());
        registry.peers.insert(
            id,
            PeerHandle {
                identity: identity.to_string(),
                addr,
                connected_at: now_micros(),
                tx,
            },
        );
        let snapshot = self.store.list("").collect();
        (id, repeat, snapshot, rx)
    }

    fn unregister(&self, id: PeerId) {
        self.registry.lock().peers.remove(&id);
    }

    /// Applies one entry message from `origin`.
    ///
    /// Accepted changes go to every other peer. The returned messages are
    /// corrections for the origin when its write lost.
    fn apply_from_peer(&self, origin: PeerId, message: Message) -> Vec<Message> {
        let registry = self.registry.lock();
        let store = &self.store;
        let (forward, reply) = match message {
            Message::EntryAssign {
                key,
                seq,
                flags,
                value,
            } => resolve(
                &key,
                store.apply_remote_assign(&key, value, EntryFlags::from_bits(flags), seq),
            ),
            Message::EntryUpdate { key, seq, value } => {
                let outcome = store.apply_remote_update(&key, seq, value);
                resolve(&key, outcome)
            }
            Message::FlagsUpdate { key, flags } => (
                messages_for(&store.apply_remote_flags(&key, EntryFlags::from_bits(flags))),
                Vec::new(),
            ),
            Message::EntryDelete { key } => {
                (messages_for(&store.apply_remote_delete(&key)), Vec::new())
            }
            Message::ClearEntries { .. } => {
                store.apply_remote_clear();
                (vec![Message::clear_entries()], Vec::new())
            }
            Message::KeepAlive => return Vec::new(),
            other => {
                tracing::warn!(
                    peer = origin,
                    code = other.type_code(),
                    "unexpected handshake message after handshake"
                );
                return Vec::new();
            }
        };
        fan_out(&registry, Some(origin), forward);
        reply
    }
}

fn resolve(key: &str, outcome: RemoteApply) -> (Vec<Message>, Vec<Message>) {
    match outcome {
        RemoteApply::Applied(changes) => (messages_for(&changes), Vec::new()),
        RemoteApply::Stale(current) => {
            tracing::debug!(key = %key, seq = current.seq.value(), "correcting stale write");
            (Vec::new(), vec![assign_for(current)])
        }
        RemoteApply::Ignored => {
            tracing::debug!(key = %key, "ignoring update for unknown or mistyped entry");
            (Vec::new(), Vec::new())
        }
    }
}

pub(crate) fn messages_for(changes: &[Change]) -> Vec<Message> {
    changes.iter().flat_map(Change::to_messages).collect()
}

fn assign_for(entry: Entry) -> Message {
    Message::EntryAssign {
        key: entry.key,
        seq: entry.seq,
        flags: entry.flags.bits(),
        value: entry.value,
    }
}

fn fan_out(registry: &Registry, origin: Option<PeerId>, messages: Vec<Message>) {
    if messages.is_empty() {
        return;
    }
    for (id, peer) in &registry.peers {
        if Some(*id) == origin {
            continue;
        }
        // A closed channel means the session is ending; it unregisters itself.
        let _ = peer.tx.send(messages.clone());
    }
}

/// Runs one peer connection to completion.
pub(crate) async fn serve_peer<R, W>(
    ctx: &ServerContext,
    read: R,
    write: W,
    addr: SocketAddr,
    shutdown: &mut watch::Receiver<bool>,
) -> ServerResult<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = FrameReader::new(read);
    let mut writer = FrameWriter::new(write);
    let config = &ctx.config;

    let hello = timeout(config.handshake_timeout, expect_hello(&mut reader)).await??;
    let (protocol_version, identity) = hello;
    if protocol_version != PROTOCOL_VERSION {
        let refusal = Message::ProtocolUnsupported {
            supported_version: PROTOCOL_VERSION,
        };
        timeout(config.write_timeout, writer.write_messages(&[refusal])).await??;
        let _ = writer.shutdown().await;
        return Err(ServerError::UnsupportedVersion {
            version: protocol_version,
        });
    }

    let (id, repeat, snapshot, mut outgoing) = ctx.register(&identity, addr);
    tracing::info!(peer = id, identity = %identity, addr = %addr, "peer connected");
    let result: ServerResult<()> = async {
        let mut greeting = Vec::with_capacity(snapshot.len() + 2);
        greeting.push(Message::ServerHello {
            flags: if repeat { SERVER_HELLO_REPEAT_CLIENT } else { 0 },
            identity: config.identity.clone(),
        });
        greeting.extend(snapshot.into_iter().map(assign_for));
        greeting.push(Message::ServerHelloDone);
        timeout(config.write_timeout, writer.write_messages(&greeting)).await??;

        let replies = timeout(
            config.handshake_timeout,
            receive_client_entries(ctx, id, &mut reader),
        )
        .await??;
        if !replies.is_empty() {
            timeout(config.write_timeout, writer.write_messages(&replies)).await??;
        }

        session_loop(ctx, id, &mut reader, &mut writer, &mut outgoing, shutdown).await
    }
    .await;

    ctx.unregister(id);
    let _ = timeout(config.write_timeout, writer.shutdown()).await;
    match &result {
        Ok(()) => tracing::info!(peer = id, "peer disconnected"),
        Err(err) => tracing::info!(peer = id, error = %err, "peer dropped"),
    }
    result
}

async fn expect_hello<R: AsyncRead + Unpin>(
    reader: &mut FrameReader<R>,
) -> ServerResult<(u16, String)> {
    loop {
        match read_message(reader).await? {
            Message::ClientHello {
                protocol_version,
                identity,
            } => return Ok((protocol_version, identity)),
            Message::KeepAlive => {}
            other => {
                return Err(ServerError::HandshakeFailed(format!(
                    "expected client hello, got message 0x{:02x}",
                    other.type_code()
                )));
            }
        }
    }
}

/// Reads the client's entry list up to `ClientHelloDone`.
async fn receive_client_entries<R: AsyncRead + Unpin>(
    ctx: &ServerContext,
    id: PeerId,
    reader: &mut FrameReader<R>,
) -> ServerResult<Vec<Message>> {
    let mut replies = Vec::new();
    let mut received = 0usize;
    loop {
        match read_message(reader).await? {
            message @ Message::EntryAssign { .. } => {
                received += 1;
                replies.extend(ctx.apply_from_peer(id, message));
            }
            Message::ClientHelloDone => break,
            Message::KeepAlive => {}
            other => {
                return Err(ServerError::HandshakeFailed(format!(
                    "unexpected message 0x{:02x} during client entry list",
                    other.type_code()
                )));
            }
        }
    }
    tracing::debug!(peer = id, received, "handshake complete");
    Ok(replies)
}

async fn session_loop<R, W>(
    ctx: &ServerContext,
    id: PeerId,
    reader: &mut FrameReader<R>,
    writer: &mut FrameWriter<W>,
    outgoing: &mut mpsc::UnboundedReceiver<Vec<Message>>,
    shutdown: &mut watch::Receiver<bool>,
) -> ServerResult<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let config = &ctx.config;
    let mut errors = ErrorWindow::new(config.max_protocol_errors, config.protocol_error_window);
    let mut keep_alive = interval_at(
        tokio::time::Instant::now() + config.keep_alive_interval,
        config.keep_alive_interval,
    );
    keep_alive.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_write = Instant::now();

    loop {
        tokio::select! {
            _ = shutdown.changed() => return Ok(()),
            batch = outgoing.recv() => {
                let Some(mut batch) = batch else {
                    return Ok(());
                };
                while let Ok(more) = outgoing.try_recv() {
                    batch.extend(more);
                }
                timeout(config.write_timeout, writer.write_messages(&batch)).await??;
                last_write = Instant::now();
            }
            _ = keep_alive.tick() => {
                if last_write.elapsed() >= config.keep_alive_interval {
                    timeout(config.write_timeout, writer.write_messages(&[Message::KeepAlive])).await??;
                    last_write = Instant::now();
                }
            }
            frame = reader.read_frame() => {
                let Some(frame) = frame? else {
                    return Ok(());
                };
                match decode_payload(&frame) {
                    Ok(message) => {
                        let replies = ctx.apply_from_peer(id, message);
                        if !replies.is_empty() {
                            timeout(config.write_timeout, writer.write_messages(&replies)).await??;
                            last_write = Instant::now();
                        }
                    }
                    Err(err) => {
                        tracing::warn!(peer = id, error = %err, len = frame.len(), "dropping undecodable frame");
                        if errors.record(Instant::now()) {
                            return Err(ServerError::Protocol(err));
                        }
                    }
                }
            }
        }
    }
}

async fn read_message<R: AsyncRead + Unpin>(reader: &mut FrameReader<R>) -> ServerResult<Message> {
    match reader.read_frame().await? {
        Some(frame) => Ok(decode_payload(&frame)?),
        None => Err(ServerError::HandshakeFailed("closed by peer".into())),
    }
}
