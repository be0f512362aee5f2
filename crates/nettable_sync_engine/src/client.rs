//! The client facade.

use crate::config::{clamp_update_rate, ClientConfig};
use crate::connection::{NetworkThread, Shared};
use crate::error::SyncResult;
use crate::state::ConnectionState;
use nettable_codec::Value;
use nettable_core::{
    ConnectionInfo, ConnectionNotification, Entries, Entry, EntryFlags, EntryNotification,
    ListenerId, NotifyKind,
};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A NetTable client.
///
/// Reads and writes go to the local entry store and never block on the
/// network. Local writes are sent to the server on the next flush, either
/// every update-rate tick or when [`flush`](Self::flush) is called.
///
/// # Example
///
/// ```no_run
/// use nettable_sync_engine::{ClientConfig, NetworkTable};
/// use nettable_core::NotifyKind;
///
/// let table = NetworkTable::new(ClientConfig::new("dashboard"));
/// table.connect("127.0.0.1", 1735).unwrap();
/// table.put_number("/drive/speed", 1.5, false).unwrap();
/// table.add_entry_listener("/drive", NotifyKind::NEW | NotifyKind::UPDATE, |n| {
///     println!("{} -> {}", n.key, n.value);
/// });
/// ```
pub struct NetworkTable {
    shared: Arc<Shared>,
    network: Mutex<Option<NetworkThread>>,
}

impl NetworkTable {
    /// Creates a disconnected client.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            shared: Arc::new(Shared::new(config)),
            network: Mutex::new(None),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.shared.config
    }

    /// Starts connecting to a server in the background.
    ///
    /// Returns immediately. Progress is reported to connection listeners.
    /// Calling this while a connection is already running does nothing.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the network thread cannot be spawned.
    pub fn connect(&self, host: &str, port: u16) -> SyncResult<()> {
        let mut network = self.network.lock();
        if network.is_some() {
            tracing::debug!(host, port, "connect called while already running");
            return Ok(());
        }
        *network = Some(NetworkThread::spawn(
            self.shared.clone(),
            host.to_string(),
            port,
        )?);
        Ok(())
    }

    /// Stops the network thread and closes the connection.
    ///
    /// Connection listeners are told if a connection was up. Idempotent.
    pub fn disconnect(&self) {
        let network = self.network.lock().take();
        if let Some(network) = network {
            network.stop();
        }
    }

    /// Returns the connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.shared.state()
    }

    /// Returns true once the handshake with the server has completed.
    pub fn is_connected(&self) -> bool {
        self.shared.state().is_connected()
    }

    /// Describes the server while connected.
    pub fn connection_info(&self) -> Option<ConnectionInfo> {
        self.shared.connection_info()
    }

    /// Sets the flush interval in seconds, clamped to `[0.01, 1.0]`.
    pub fn set_update_rate(&self, seconds: f64) {
        self.shared.set_update_rate(clamp_update_rate(seconds));
    }

    /// Returns the effective flush interval.
    pub fn update_rate(&self) -> Duration {
        self.shared.update_rate()
    }

    /// Sends queued writes now instead of at the next tick.
    pub fn flush(&self) {
        self.shared.request_flush();
    }

    /// Number of messages waiting for the next flush.
    pub fn pending_messages(&self) -> usize {
        self.shared.pending_messages()
    }

    /// Returns the boolean under `key`, or `default`.
    pub fn get_boolean(&self, key: &str, default: bool) -> bool {
        self.get_value(key)
            .and_then(|value| value.as_boolean())
            .unwrap_or(default)
    }

    /// Returns the number under `key`, or `default`.
    pub fn get_number(&self, key: &str, default: f64) -> f64 {
        self.get_value(key)
            .and_then(|value| value.as_double())
            .unwrap_or(default)
    }

    /// Returns the string under `key`, or `default`.
    pub fn get_string(&self, key: &str, default: &str) -> String {
        match self.get_value(key) {
            Some(Value::String(s)) => s,
            _ => default.to_string(),
        }
    }

    /// Returns the value under `key`.
    pub fn get_value(&self, key: &str) -> Option<Value> {
        self.shared.store.get_value(key)
    }

    /// Returns the entry under `key`.
    pub fn get_entry(&self, key: &str) -> Option<Entry> {
        self.shared.store.get(key)
    }

    /// Snapshot of the entries under `prefix`.
    pub fn entries(&self, prefix: &str) -> Entries {
        self.shared.store.list(prefix)
    }

    /// Writes a boolean.
    ///
    /// # Errors
    ///
    /// See [`put_value`](Self::put_value).
    pub fn put_boolean(&self, key: &str, value: bool, force: bool) -> SyncResult<()> {
        self.put_value(key, Value::Boolean(value), force)
    }

    /// Writes a number.
    ///
    /// # Errors
    ///
    /// See [`put_value`](Self::put_value).
    pub fn put_number(&self, key: &str, value: f64, force: bool) -> SyncResult<()> {
        self.put_value(key, Value::Double(value), force)
    }

    /// Writes a string.
    ///
    /// # Errors
    ///
    /// See [`put_value`](Self::put_value).
    pub fn put_string(&self, key: &str, value: &str, force: bool) -> SyncResult<()> {
        self.put_value(key, Value::String(value.to_string()), force)
    }

    /// Writes a value.
    ///
    /// # Errors
    ///
    /// Returns a store error for an empty key, or for a type change
    /// without `force`.
    pub fn put_value(&self, key: &str, value: Value, force: bool) -> SyncResult<()> {
        let changes = self.shared.store.put(key, value, force)?;
        self.shared.publish(changes);
        Ok(())
    }

    /// Deletes the entry under `key`.
    pub fn delete(&self, key: &str) {
        let changes = self.shared.store.delete(key);
        self.shared.publish(changes);
    }

    /// Deletes every entry without the persistent flag, here and on the
    /// server.
    pub fn delete_all(&self) {
        let changes = self.shared.store.delete_all();
        self.shared.publish_clear(changes);
    }

    /// Replaces the flags of the entry under `key`.
    ///
    /// # Errors
    ///
    /// Returns a store error for an empty key.
    pub fn set_flags(&self, key: &str, flags: EntryFlags) -> SyncResult<()> {
        let changes = self.shared.store.set_flags(key, flags)?;
        self.shared.publish(changes);
        Ok(())
    }

    /// Returns the flags of the entry under `key`.
    pub fn flags(&self, key: &str) -> Option<EntryFlags> {
        self.shared.store.flags(key)
    }

    /// Registers an entry listener.
    ///
    /// See [`Dispatcher::add_entry_listener`](nettable_core::Dispatcher::add_entry_listener).
    pub fn add_entry_listener<F>(&self, prefix: &str, mask: NotifyKind, callback: F) -> ListenerId
    where
        F: Fn(&EntryNotification) + Send + Sync + 'static,
    {
        self.shared
            .dispatcher
            .add_entry_listener(&self.shared.store, prefix, mask, callback)
    }

    /// Removes an entry listener. After this returns it is never invoked
    /// again.
    pub fn remove_entry_listener(&self, id: ListenerId) -> bool {
        self.shared.dispatcher.remove_entry_listener(id)
    }

    /// Registers a connection listener. With `notify_immediately`, a live
    /// connection is reported before this returns.
    pub fn add_connection_listener<F>(&self, callback: F, notify_immediately: bool) -> ListenerId
    where
        F: Fn(&ConnectionNotification) + Send + Sync + 'static,
    {
        self.shared
            .add_connection_listener(callback, notify_immediately)
    }

    /// Removes a connection listener.
    pub fn remove_connection_listener(&self, id: ListenerId) -> bool {
        self.shared.dispatcher.remove_connection_listener(id)
    }

    /// Blocks until every notification queued so far has been delivered.
    pub fn wait_for_notifications(&self) {
        self.shared.dispatcher.wait_idle();
    }
}

impl Default for NetworkTable {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl Drop for NetworkTable {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl fmt::Debug for NetworkTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkTable")
            .field("identity", &self.shared.config.identity)
            .field("state", &self.shared.state())
            .field("entries", &self.shared.store.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nettable_core::CoreError;
    use crate::error::SyncError;

    #[test]
    fn local_reads_and_writes() {
        let table = NetworkTable::default();
        table.put_boolean("enabled", true, false).unwrap();
        table.put_number("/speed", 2.5, false).unwrap();
        table.put_string("/name", "bot", false).unwrap();

        assert!(table.get_boolean("/enabled", false));
        assert_eq!(table.get_number("speed", 0.0), 2.5);
        assert_eq!(table.get_string("/name", "none"), "bot");
        assert_eq!(table.entries("").count(), 3);
    }

    #[test]
    fn getters_fall_back_to_default() {
        let table = NetworkTable::default();
        table.put_number("/n", 1.0, false).unwrap();

        assert!(!table.get_boolean("/n", false));
        assert_eq!(table.get_string("/n", "fallback"), "fallback");
        assert_eq!(table.get_string("/missing", "fallback"), "fallback");
        assert_eq!(table.get_number("/missing", -1.0), -1.0);
    }

    #[test]
    fn type_conflict_surfaces_as_store_error() {
        let table = NetworkTable::default();
        table.put_number("/n", 1.0, false).unwrap();
        let err = table.put_string("/n", "x", false).unwrap_err();
        assert!(matches!(err, SyncError::Core(CoreError::TypeConflict { .. })));
        table.put_string("/n", "x", true).unwrap();
        assert_eq!(table.get_string("/n", ""), "x");
    }

    #[test]
    fn update_rate_is_clamped() {
        let table = NetworkTable::default();
        table.set_update_rate(0.001);
        assert_eq!(table.update_rate(), Duration::from_millis(10));
        table.set_update_rate(0.5);
        assert_eq!(table.update_rate(), Duration::from_millis(500));
    }

    #[test]
    fn nothing_is_queued_while_disconnected() {
        let table = NetworkTable::default();
        table.put_number("/n", 1.0, false).unwrap();
        table.delete_all();
        assert_eq!(table.pending_messages(), 0);
        assert!(!table.is_connected());
        assert!(table.connection_info().is_none());
    }

    #[test]
    fn local_listener_sees_own_writes() {
        let table = NetworkTable::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        table.add_entry_listener("/", NotifyKind::NEW | NotifyKind::LOCAL, move |n| {
            sink.lock().push(n.key.clone());
        });
        table.put_number("/a", 1.0, false).unwrap();
        table.wait_for_notifications();
        assert_eq!(*seen.lock(), vec!["/a".to_string()]);
    }

    #[test]
    fn flags_roundtrip() {
        let table = NetworkTable::default();
        table.put_number("/p", 1.0, false).unwrap();
        table.set_flags("/p", EntryFlags::PERSISTENT).unwrap();
        assert_eq!(table.flags("/p"), Some(EntryFlags::PERSISTENT));
        table.delete_all();
        assert!(table.get_entry("/p").is_some());
        table.delete("/p");
        assert!(table.get_entry("/p").is_none());
    }

    #[test]
    fn disconnect_is_idempotent() {
        let table = NetworkTable::default();
        table.disconnect();
        table.disconnect();
        assert_eq!(table.connection_state(), ConnectionState::Disconnected);
    }
}
