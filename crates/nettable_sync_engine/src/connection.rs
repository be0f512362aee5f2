//! Background network task.
//!
//! One thread per client runs a current-thread tokio runtime. The task
//! connects, performs the handshake, then multiplexes the receive path,
//! the flush timer and explicit flush requests until it is cancelled or
//! the connection fails, in which case it backs off and reconnects.

use crate::config::ClientConfig;
use crate::error::{SyncError, SyncResult};
use crate::outbox::Outbox;
use crate::state::ConnectionState;
use crate::transport::Transport;
use nettable_core::{
    normalize_key, now_micros, Change, ConnectionInfo, ConnectionNotification, Dispatcher,
    EntryFlags, EntryStore, ListenerId, RemoteApply,
};
use nettable_sync_protocol::{decode_payload, ErrorWindow, Message, PROTOCOL_VERSION};
use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::time::{interval_at, timeout, Instant, Interval, MissedTickBehavior};

/// State shared between the API and the network task.
pub(crate) struct Shared {
    pub(crate) config: ClientConfig,
    pub(crate) store: EntryStore,
    pub(crate) dispatcher: Dispatcher,
    outbox: Mutex<Outbox>,
    state: RwLock<ConnectionState>,
    info: RwLock<Option<ConnectionInfo>>,
    update_rate: RwLock<Duration>,
    flush_now: Notify,
}

impl Shared {
    pub(crate) fn new(config: ClientConfig) -> Self {
        let update_rate = config.update_rate;
        Self {
            config,
            store: EntryStore::new(),
            dispatcher: Dispatcher::new(),
            outbox: Mutex::new(Outbox::new()),
            state: RwLock::new(ConnectionState::Disconnected),
            info: RwLock::new(None),
            update_rate: RwLock::new(update_rate),
            flush_now: Notify::new(),
        }
    }

    pub(crate) fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Returns the connection description while connected.
    pub(crate) fn connection_info(&self) -> Option<ConnectionInfo> {
        if self.state().is_connected() {
            self.info.read().clone()
        } else {
            None
        }
    }

    pub(crate) fn update_rate(&self) -> Duration {
        *self.update_rate.read()
    }

    pub(crate) fn set_update_rate(&self, rate: Duration) {
        *self.update_rate.write() = rate;
    }

    pub(crate) fn request_flush(&self) {
        self.flush_now.notify_one();
    }

    pub(crate) fn pending_messages(&self) -> usize {
        self.outbox.lock().len()
    }

    /// Queues local changes for the server and hands them to listeners.
    ///
    /// Nothing is queued while disconnected; the next handshake carries
    /// the state instead.
    pub(crate) fn publish(&self, changes: Vec<Change>) {
        if changes.is_empty() {
            return;
        }
        {
            let mut outbox = self.outbox.lock();
            if self.state().is_active() {
                outbox.extend_from_changes(&changes);
            }
        }
        self.dispatcher.notify_entries(changes);
    }

    /// Like [`publish`](Self::publish) for a local `delete_all`, which goes
    /// out as a single clear-all message.
    pub(crate) fn publish_clear(&self, changes: Vec<Change>) {
        {
            let mut outbox = self.outbox.lock();
            if self.state().is_active() {
                outbox.push(Message::clear_entries());
            }
        }
        self.dispatcher.notify_entries(changes);
    }

    fn take_outbox(&self) -> Vec<Message> {
        self.outbox.lock().take()
    }

    fn begin_connecting(&self) {
        let mut outbox = self.outbox.lock();
        *self.state.write() = ConnectionState::Connecting;
        outbox.clear();
    }

    fn mark_connected(&self, info: ConnectionInfo) {
        self.dispatcher
            .notify_connection_with(true, info.clone(), || {
                *self.info.write() = Some(info);
                *self.state.write() = ConnectionState::Connected;
            });
    }

    fn mark_disconnected(&self) {
        let mut outbox = self.outbox.lock();
        outbox.clear();
        if !self.state().is_connected() {
            *self.state.write() = ConnectionState::Disconnected;
            return;
        }
        let info = self.info.read().clone().unwrap_or_default();
        self.dispatcher.notify_connection_with(false, info, || {
            *self.state.write() = ConnectionState::Disconnected;
            self.info.write().take();
        });
    }

    /// Registers a connection listener; see
    /// [`Dispatcher::add_connection_listener`].
    pub(crate) fn add_connection_listener<F>(&self, callback: F, notify_immediately: bool) -> ListenerId
    where
        F: Fn(&ConnectionNotification) + Send + Sync + 'static,
    {
        self.dispatcher
            .add_connection_listener(callback, notify_immediately, || self.connection_info())
    }

    fn touch(&self) {
        if let Some(info) = self.info.write().as_mut() {
            info.last_update = now_micros();
        }
    }
}

/// Handle to the running network thread.
pub(crate) struct NetworkThread {
    cancel: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl NetworkThread {
    /// Starts connecting to `host:port` in the background.
    pub(crate) fn spawn(shared: Arc<Shared>, host: String, port: u16) -> SyncResult<Self> {
        let (cancel, cancel_rx) = watch::channel(false);
        let handle = thread::Builder::new()
            .name("nettable-net".into())
            .spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build();
                match runtime {
                    Ok(runtime) => runtime.block_on(run(shared, host, port, cancel_rx)),
                    Err(err) => tracing::error!(error = %err, "failed to start network runtime"),
                }
            })?;
        Ok(Self {
            cancel,
            handle: Some(handle),
        })
    }

    /// Cancels the task and waits for the thread to exit.
    pub(crate) fn stop(mut self) {
        let _ = self.cancel.send(true);
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                tracing::warn!("network thread panicked");
            }
        }
    }
}

async fn run(shared: Arc<Shared>, host: String, port: u16, mut cancel: watch::Receiver<bool>) {
    let mut attempt: u32 = 0;
    while !*cancel.borrow() {
        shared.begin_connecting();
        let mut reached = false;
        let result = session(&shared, &host, port, &mut cancel, &mut reached).await;
        shared.mark_disconnected();

        let err = match result {
            Ok(()) => break,
            Err(err) => err,
        };
        if reached {
            attempt = 0;
            tracing::warn!(error = %err, host = %host, port, "connection lost");
        } else {
            tracing::debug!(error = %err, host = %host, port, "connection attempt failed");
        }
        attempt = attempt.saturating_add(1);

        let mut delay = shared
            .config
            .retry
            .delay_for_attempt(attempt)
            .max(shared.update_rate());
        if !err.is_retryable() {
            delay = delay.max(shared.config.retry.max_delay);
        }
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = cancel.changed() => break,
        }
    }
    tracing::debug!("network task stopped");
}

async fn session(
    shared: &Shared,
    host: &str,
    port: u16,
    cancel: &mut watch::Receiver<bool>,
    reached: &mut bool,
) -> SyncResult<()> {
    let config = &shared.config;
    let establish = async {
        let mut transport =
            Transport::connect(host, port, config.connect_timeout, config.write_timeout).await?;
        let info = timeout(config.handshake_timeout, handshake(shared, &mut transport)).await??;
        Ok::<_, SyncError>((transport, info))
    };
    let (mut transport, info) = tokio::select! {
        result = establish => result?,
        _ = cancel.changed() => return Ok(()),
    };

    tracing::info!(
        remote = %info.remote_id,
        addr = %transport.peer(),
        "connected"
    );
    shared.mark_connected(info);
    *reached = true;

    let result = serve(shared, &mut transport, cancel).await;
    transport.close().await;
    result
}

/// Client side of the handshake. Returns the connection description.
async fn handshake(shared: &Shared, transport: &mut Transport) -> SyncResult<ConnectionInfo> {
    transport
        .send(&[Message::client_hello(shared.config.identity.clone())])
        .await?;

    let remote_id = loop {
        match transport.recv_message().await? {
            Message::ServerHello { identity, .. } => break identity,
            Message::ProtocolUnsupported { supported_version } => {
                return Err(SyncError::VersionMismatch {
                    local: PROTOCOL_VERSION,
                    remote: supported_version,
                });
            }
            Message::KeepAlive => {}
            other => {
                return Err(SyncError::HandshakeFailed(format!(
                    "expected server hello, got message 0x{:02x}",
                    other.type_code()
                )));
            }
        }
    };

    // The server's entries win for every key it announces
    let mut announced = HashSet::new();
    loop {
        match transport.recv_message().await? {
            Message::EntryAssign {
                key,
                seq,
                flags,
                value,
            } => {
                if key.is_empty() {
                    continue;
                }
                let key = normalize_key(&key);
                let flags = EntryFlags::from_bits(flags);
                let changes = shared.store.apply_authoritative(&key, value, flags, seq);
                shared.dispatcher.notify_entries(changes);
                announced.insert(key);
            }
            Message::ServerHelloDone => break,
            Message::KeepAlive => {}
            other => {
                return Err(SyncError::HandshakeFailed(format!(
                    "unexpected message 0x{:02x} during server entry list",
                    other.type_code()
                )));
            }
        }
    }

    let mut reply: Vec<Message> = shared
        .store
        .list("")
        .filter(|entry| !announced.contains(&entry.key))
        .map(|entry| Message::EntryAssign {
            key: entry.key,
            seq: entry.seq,
            flags: entry.flags.bits(),
            value: entry.value,
        })
        .collect();
    tracing::debug!(
        received = announced.len(),
        sent = reply.len(),
        "handshake entry exchange"
    );
    reply.push(Message::ClientHelloDone);
    transport.send(&reply).await?;

    let peer = transport.peer();
    Ok(ConnectionInfo {
        remote_id,
        remote_ip: peer.ip().to_string(),
        remote_port: peer.port(),
        last_update: now_micros(),
        protocol_version: PROTOCOL_VERSION,
    })
}

fn flush_ticker(rate: Duration) -> Interval {
    let mut ticker = interval_at(Instant::now() + rate, rate);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

async fn flush(shared: &Shared, transport: &mut Transport) -> SyncResult<()> {
    let batch = shared.take_outbox();
    if !batch.is_empty() {
        tracing::trace!(messages = batch.len(), "flushing outbox");
    }
    transport.send(&batch).await
}

async fn serve(
    shared: &Shared,
    transport: &mut Transport,
    cancel: &mut watch::Receiver<bool>,
) -> SyncResult<()> {
    let config = &shared.config;
    let mut rate = shared.update_rate();
    let mut ticker = flush_ticker(rate);
    let mut errors = ErrorWindow::new(config.max_protocol_errors, config.protocol_error_window);

    loop {
        tokio::select! {
            _ = cancel.changed() => {
                flush(shared, transport).await?;
                return Ok(());
            }
            _ = ticker.tick() => {
                flush(shared, transport).await?;
                if transport.idle_for() >= config.keep_alive_interval {
                    transport.send(&[Message::KeepAlive]).await?;
                }
                let current = shared.update_rate();
                if current != rate {
                    rate = current;
                    ticker = flush_ticker(rate);
                }
            }
            _ = shared.flush_now.notified() => {
                flush(shared, transport).await?;
            }
            frame = transport.recv_frame() => {
                let frame = frame?;
                shared.touch();
                match decode_payload(&frame) {
                    Ok(message) => apply_inbound(shared, message),
                    Err(err) => {
                        tracing::warn!(error = %err, len = frame.len(), "dropping undecodable frame");
                        if errors.record(std::time::Instant::now()) {
                            return Err(SyncError::ConnectionLost(format!(
                                "{} protocol errors within {:?}",
                                config.max_protocol_errors, config.protocol_error_window
                            )));
                        }
                    }
                }
            }
        }
    }
}

/// Applies one message from the server and dispatches the result.
fn apply_inbound(shared: &Shared, message: Message) {
    let store = &shared.store;
    let changes = match message {
        Message::KeepAlive => return,
        Message::EntryAssign {
            key,
            seq,
            flags,
            value,
        } => store
            .apply_remote_assign(&key, value, EntryFlags::from_bits(flags), seq)
            .into_changes(),
        Message::EntryUpdate { key, seq, value } => {
            match store.apply_remote_update(&key, seq, value) {
                RemoteApply::Applied(changes) => changes,
                RemoteApply::Stale(current) => {
                    tracing::debug!(
                        key = %key,
                        local = current.seq.value(),
                        remote = seq.value(),
                        "ignoring stale update"
                    );
                    return;
                }
                RemoteApply::Ignored => {
                    tracing::debug!(key = %key, "ignoring update for unknown or mistyped entry");
                    return;
                }
            }
        }
        Message::FlagsUpdate { key, flags } => {
            store.apply_remote_flags(&key, EntryFlags::from_bits(flags))
        }
        Message::EntryDelete { key } => store.apply_remote_delete(&key),
        Message::ClearEntries { .. } => store.apply_remote_clear(),
        other => {
            tracing::warn!(code = other.type_code(), "unexpected handshake message after handshake");
            return;
        }
    };
    shared.dispatcher.notify_entries(changes);
}
