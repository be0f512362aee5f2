//! Listener registry and notification dispatch.
//!
//! Notifications are queued on a FIFO channel and delivered by a dedicated
//! dispatch thread, so callbacks never run while a store lock is held and
//! may call back into the table freely.
//!
//! The set of listeners an event reaches is fixed when the event is
//! queued, so a listener registered afterwards does not see it.
//!
//! Each listener owns a reentrant gate. Delivery takes the gate and checks
//! that the listener is still active; removal takes the gate and clears the
//! flag. Once `remove_*` returns no new invocation can start, a call
//! already running on another thread has finished, and a callback may
//! remove itself without deadlocking.

use crate::entry::Change;
use crate::flags::EntryFlags;
use crate::key::normalize_key;
use crate::notify::NotifyKind;
use crate::store::EntryStore;
use nettable_codec::Value;
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

/// Opaque handle of a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u32);

impl ListenerId {
    /// Returns the raw id. Never zero.
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Delivered to entry listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryNotification {
    /// Listener receiving the notification.
    pub listener: ListenerId,
    /// Normalized key.
    pub key: String,
    /// Value after the change, or the last value for a delete.
    pub value: Value,
    /// Entry flags after the change.
    pub flags: EntryFlags,
    /// What happened.
    pub kind: NotifyKind,
}

/// Description of the remote end of a connection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionInfo {
    /// Identity string announced by the remote.
    pub remote_id: String,
    /// Remote IP address.
    pub remote_ip: String,
    /// Remote TCP port.
    pub remote_port: u16,
    /// Microseconds since the Unix epoch of the last frame received.
    pub last_update: u64,
    /// Protocol version negotiated with the remote.
    pub protocol_version: u16,
}

/// Delivered to connection listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionNotification {
    /// Listener receiving the notification.
    pub listener: ListenerId,
    /// True on connect, false on disconnect.
    pub connected: bool,
    /// The connection this is about.
    pub info: ConnectionInfo,
}

type EntryCallback = Box<dyn Fn(&EntryNotification) + Send + Sync>;
type ConnectionCallback = Box<dyn Fn(&ConnectionNotification) + Send + Sync>;

struct Slot<C> {
    gate: ReentrantMutex<()>,
    active: AtomicBool,
    callback: C,
}

impl<C> Slot<C> {
    fn new(callback: C) -> Self {
        Self {
            gate: ReentrantMutex::new(()),
            active: AtomicBool::new(true),
            callback,
        }
    }

    fn deactivate(&self) {
        let _gate = self.gate.lock();
        self.active.store(false, Ordering::Release);
    }
}

struct EntryListener {
    id: ListenerId,
    prefix: String,
    mask: NotifyKind,
    slot: Slot<EntryCallback>,
}

impl EntryListener {
    fn wants(&self, change: &Change) -> bool {
        change.key.starts_with(&self.prefix) && change.kind.is_delivered_to(self.mask)
    }

    fn invoke(&self, key: &str, value: &Value, flags: EntryFlags, kind: NotifyKind) {
        let _gate = self.slot.gate.lock();
        if !self.slot.active.load(Ordering::Acquire) {
            return;
        }
        let notification = EntryNotification {
            listener: self.id,
            key: key.to_string(),
            value: value.clone(),
            flags,
            kind,
        };
        (self.slot.callback)(&notification);
    }
}

struct ConnectionListener {
    id: ListenerId,
    slot: Slot<ConnectionCallback>,
}

impl ConnectionListener {
    fn invoke(&self, connected: bool, info: &ConnectionInfo) {
        let _gate = self.slot.gate.lock();
        if !self.slot.active.load(Ordering::Acquire) {
            return;
        }
        let notification = ConnectionNotification {
            listener: self.id,
            connected,
            info: info.clone(),
        };
        (self.slot.callback)(&notification);
    }
}

#[derive(Default)]
struct Registry {
    next_id: AtomicU32,
    entry: RwLock<BTreeMap<ListenerId, Arc<EntryListener>>>,
    connection: RwLock<BTreeMap<ListenerId, Arc<ConnectionListener>>>,
}

impl Registry {
    fn allocate(&self) -> ListenerId {
        ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn entry_listeners(&self) -> Vec<Arc<EntryListener>> {
        self.entry.read().values().cloned().collect()
    }
}

enum Event {
    Entries {
        changes: Vec<Change>,
        listeners: Vec<Arc<EntryListener>>,
    },
    Connection {
        connected: bool,
        info: ConnectionInfo,
        listeners: Vec<Arc<ConnectionListener>>,
    },
    Barrier(Sender<()>),
}

impl Event {
    fn deliver(self) {
        match self {
            Event::Entries { changes, listeners } => {
                for change in &changes {
                    for listener in listeners.iter().filter(|l| l.wants(change)) {
                        listener.invoke(&change.key, &change.value, change.flags, change.kind);
                    }
                }
            }
            Event::Connection {
                connected,
                info,
                listeners,
            } => {
                for listener in listeners {
                    listener.invoke(connected, &info);
                }
            }
            Event::Barrier(done) => {
                let _ = done.send(());
            }
        }
    }
}

/// Registry of entry and connection listeners plus the dispatch thread.
pub struct Dispatcher {
    registry: Registry,
    queue: Mutex<Option<Sender<Event>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    worker_id: Option<ThreadId>,
}

impl Dispatcher {
    /// Creates a dispatcher and starts its thread.
    pub fn new() -> Self {
        let registry = Registry::default();
        let (tx, rx) = mpsc::channel();
        let worker = thread::Builder::new()
            .name("nettable-dispatch".into())
            .spawn(move || run(&rx));
        let (worker, worker_id) = match worker {
            Ok(handle) => {
                let id = handle.thread().id();
                (Some(handle), Some(id))
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to spawn dispatch thread, delivering inline");
                (None, None)
            }
        };
        Self {
            registry,
            queue: Mutex::new(worker.as_ref().map(|_| tx)),
            worker: Mutex::new(worker),
            worker_id,
        }
    }

    /// Registers an entry listener for keys starting with `prefix`.
    ///
    /// With `NotifyKind::IMMEDIATE` in `mask`, every matching entry in
    /// `store` is delivered as `IMMEDIATE | UPDATE` on the calling thread
    /// before this returns. Queued changes for the new listener wait until
    /// that replay has finished.
    pub fn add_entry_listener<F>(
        &self,
        store: &EntryStore,
        prefix: &str,
        mask: NotifyKind,
        callback: F,
    ) -> ListenerId
    where
        F: Fn(&EntryNotification) + Send + Sync + 'static,
    {
        let listener = Arc::new(EntryListener {
            id: self.registry.allocate(),
            prefix: normalize_key(prefix),
            mask,
            slot: Slot::new(Box::new(callback)),
        });
        let id = listener.id;

        if mask.contains(NotifyKind::IMMEDIATE) {
            let _gate = listener.slot.gate.lock();
            self.registry.entry.write().insert(id, listener.clone());
            for entry in store.list(&listener.prefix) {
                listener.invoke(
                    &entry.key,
                    &entry.value,
                    entry.flags,
                    NotifyKind::IMMEDIATE | NotifyKind::UPDATE,
                );
            }
        } else {
            self.registry.entry.write().insert(id, listener);
        }
        tracing::debug!(listener = %id, prefix, ?mask, "entry listener added");
        id
    }

    /// Removes an entry listener. Returns false if `id` was not registered.
    pub fn remove_entry_listener(&self, id: ListenerId) -> bool {
        let removed = self.registry.entry.write().remove(&id);
        match removed {
            Some(listener) => {
                listener.slot.deactivate();
                true
            }
            None => false,
        }
    }

    /// Registers a connection listener.
    ///
    /// `current` is evaluated while no connection event can be queued.
    /// When `notify_immediately` is set and it describes a live
    /// connection, the listener is told about it before this returns;
    /// otherwise the listener receives the next queued event. Either way
    /// a state change is reported exactly once.
    pub fn add_connection_listener<F, S>(
        &self,
        callback: F,
        notify_immediately: bool,
        current: S,
    ) -> ListenerId
    where
        F: Fn(&ConnectionNotification) + Send + Sync + 'static,
        S: FnOnce() -> Option<ConnectionInfo>,
    {
        let listener = Arc::new(ConnectionListener {
            id: self.registry.allocate(),
            slot: Slot::new(Box::new(callback)),
        });
        let id = listener.id;

        let _gate = listener.slot.gate.lock();
        let immediate = {
            let mut listeners = self.registry.connection.write();
            listeners.insert(id, listener.clone());
            current().filter(|_| notify_immediately)
        };
        if let Some(info) = immediate {
            listener.invoke(true, &info);
        }
        id
    }

    /// Removes a connection listener. Returns false if `id` was not
    /// registered.
    pub fn remove_connection_listener(&self, id: ListenerId) -> bool {
        let removed = self.registry.connection.write().remove(&id);
        match removed {
            Some(listener) => {
                listener.slot.deactivate();
                true
            }
            None => false,
        }
    }

    /// Number of registered entry listeners.
    pub fn entry_listener_count(&self) -> usize {
        self.registry.entry.read().len()
    }

    /// Queues store changes for the currently registered listeners.
    pub fn notify_entries(&self, changes: Vec<Change>) {
        if changes.is_empty() {
            return;
        }
        let listeners = self.registry.entry_listeners();
        if listeners.is_empty() {
            return;
        }
        self.send(Event::Entries { changes, listeners });
    }

    /// Queues a connection state change for delivery.
    pub fn notify_connection(&self, connected: bool, info: ConnectionInfo) {
        self.notify_connection_with(connected, info, || {});
    }

    /// Runs `update` and queues a connection state change as one step
    /// with respect to [`add_connection_listener`](Self::add_connection_listener).
    ///
    /// `update` publishes the new state; a listener registering
    /// concurrently either sees the old state and this event, or the new
    /// state alone.
    pub fn notify_connection_with(
        &self,
        connected: bool,
        info: ConnectionInfo,
        update: impl FnOnce(),
    ) {
        let event = {
            let listeners = self.registry.connection.read();
            update();
            Event::Connection {
                connected,
                info,
                listeners: listeners.values().cloned().collect(),
            }
        };
        self.send(event);
    }

    /// Blocks until everything queued before this call has been delivered.
    ///
    /// Returns immediately when called from a callback.
    pub fn wait_idle(&self) {
        if Some(thread::current().id()) == self.worker_id {
            return;
        }
        let (tx, rx) = mpsc::channel();
        self.send(Event::Barrier(tx));
        let _ = rx.recv();
    }

    fn send(&self, event: Event) {
        let undelivered = match self.queue.lock().as_ref() {
            Some(tx) => tx.send(event).err().map(|mpsc::SendError(event)| event),
            None => Some(event),
        };
        // Thread gone: deliver on the caller
        if let Some(event) = undelivered {
            event.deliver();
        }
    }

    /// Stops the dispatch thread after it drains the queue.
    pub fn shutdown(&self) {
        self.queue.lock().take();
        let worker = self.worker.lock().take();
        if let Some(handle) = worker {
            if Some(thread::current().id()) == self.worker_id {
                return;
            }
            if handle.join().is_err() {
                tracing::warn!("dispatch thread panicked");
            }
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("entry_listeners", &self.registry.entry.read().len())
            .field("connection_listeners", &self.registry.connection.read().len())
            .finish()
    }
}

fn run(rx: &Receiver<Event>) {
    while let Ok(event) = rx.recv() {
        event.deliver();
    }
    tracing::debug!("dispatch thread stopped");
}
