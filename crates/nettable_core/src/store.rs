//! Entry store.
//!
//! The store is the local cache of the table. Every mutation returns the
//! [`Change`] records it produced; the store never calls listeners itself,
//! so callbacks always run after the lock is released.

use crate::clock::MonotonicClock;
use crate::entry::{Change, Entries, Entry};
use crate::error::{CoreError, CoreResult};
use crate::flags::EntryFlags;
use crate::key::{normalize_key, validate_key};
use crate::notify::NotifyKind;
use nettable_codec::{CodecError, EntryTypes, Value};
use nettable_sync_protocol::{entry_frame_len, SequenceNumber, MAX_FRAME_LEN};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Rule for accepting a remote write to an existing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SequencePolicy {
    /// Accept unless the incoming sequence number is older. Used by clients.
    #[default]
    NotOlder,
    /// Accept only strictly newer sequence numbers. Used by the server.
    StrictlyNewer,
}

/// Outcome of applying a remote assign or update.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteApply {
    /// The write was accepted and produced these changes (possibly none).
    Applied(Vec<Change>),
    /// The write lost against the current entry, returned here.
    Stale(Entry),
    /// The write does not apply to this store (unknown key, wrong type, or
    /// empty key).
    Ignored,
}

impl RemoteApply {
    /// Returns the produced changes, or an empty list.
    pub fn into_changes(self) -> Vec<Change> {
        match self {
            RemoteApply::Applied(changes) => changes,
            RemoteApply::Stale(_) | RemoteApply::Ignored => Vec::new(),
        }
    }
}

/// Thread-safe ordered map of entries.
#[derive(Debug, Default)]
pub struct EntryStore {
    entries: RwLock<BTreeMap<String, Entry>>,
    clock: MonotonicClock,
    policy: SequencePolicy,
}

impl EntryStore {
    /// Creates an empty client-side store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store that only accepts strictly newer writes.
    pub fn authoritative() -> Self {
        Self {
            policy: SequencePolicy::StrictlyNewer,
            ..Self::default()
        }
    }

    /// Returns the sequence policy.
    pub fn policy(&self) -> SequencePolicy {
        self.policy
    }

    /// Returns a copy of the entry under `key`.
    pub fn get(&self, key: &str) -> Option<Entry> {
        if key.is_empty() {
            return None;
        }
        self.entries.read().get(&normalize_key(key)).cloned()
    }

    /// Returns the value under `key`.
    pub fn get_value(&self, key: &str) -> Option<Value> {
        self.get(key).map(|entry| entry.value)
    }

    /// Returns the flags of the entry under `key`.
    pub fn flags(&self, key: &str) -> Option<EntryFlags> {
        self.get(key).map(|entry| entry.flags)
    }

    /// Returns true if an entry exists under `key`.
    pub fn contains(&self, key: &str) -> bool {
        !key.is_empty() && self.entries.read().contains_key(&normalize_key(key))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the store has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Writes `value` under `key`.
    ///
    /// Writing the current value again is a no-op. Writing a value of a
    /// different type fails unless `force` is set, in which case the old
    /// entry is deleted and a new one created.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidKey`] for an empty key,
    /// [`CoreError::ValueTooLarge`] for a value peers could not receive and
    /// [`CoreError::TypeConflict`] for a type change without `force`.
    pub fn put(&self, key: &str, value: Value, force: bool) -> CoreResult<Vec<Change>> {
        let key = validate_key(key)?;
        check_size(&key, &value)?;
        let mut entries = self.entries.write();

        let Some(entry) = entries.get_mut(&key) else {
            let entry = self.new_entry(key, value, EntryFlags::NONE, SequenceNumber::default());
            let change = Change::from_entry(&entry, NotifyKind::NEW | NotifyKind::LOCAL);
            entries.insert(entry.key.clone(), entry);
            return Ok(vec![change]);
        };

        if entry.entry_type() == value.entry_type() {
            if entry.value == value {
                return Ok(Vec::new());
            }
            entry.value = value;
            entry.seq = entry.seq.next();
            entry.last_change = self.clock.tick();
            return Ok(vec![Change::from_entry(
                entry,
                NotifyKind::UPDATE | NotifyKind::LOCAL,
            )]);
        }

        if !force {
            return Err(CoreError::TypeConflict {
                key,
                existing: entry.entry_type(),
                attempted: value.entry_type(),
            });
        }

        let deleted = Change::from_entry(entry, NotifyKind::DELETE | NotifyKind::LOCAL);
        let seq = entry.seq.next();
        let replacement = self.new_entry(key, value, EntryFlags::NONE, seq);
        let created = Change::from_entry(&replacement, NotifyKind::NEW | NotifyKind::LOCAL);
        *entry = replacement;
        Ok(vec![deleted, created])
    }

    /// Removes the entry under `key`.
    pub fn delete(&self, key: &str) -> Vec<Change> {
        if key.is_empty() {
            return Vec::new();
        }
        self.remove(&normalize_key(key), NotifyKind::LOCAL)
    }

    /// Replaces the flags of an existing entry.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidKey`] for an empty key.
    pub fn set_flags(&self, key: &str, flags: EntryFlags) -> CoreResult<Vec<Change>> {
        let key = validate_key(key)?;
        Ok(self.update_flags(&key, flags, NotifyKind::LOCAL))
    }

    /// Removes every entry without the persistent flag.
    pub fn delete_all(&self) -> Vec<Change> {
        self.clear(NotifyKind::LOCAL)
    }

    /// Snapshot of the entries whose key starts with `prefix`.
    ///
    /// The prefix is normalized, so `""` lists everything.
    pub fn list(&self, prefix: &str) -> Entries {
        self.list_typed(prefix, EntryTypes::ANY)
    }

    /// Snapshot of the entries under `prefix` whose type is in `types`.
    pub fn list_typed(&self, prefix: &str, types: EntryTypes) -> Entries {
        let prefix = normalize_key(prefix);
        let entries = self.entries.read();
        let snapshot = entries
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter(|(_, entry)| types.matches(entry.entry_type()))
            .map(|(_, entry)| entry.clone())
            .collect();
        Entries::new(snapshot)
    }

    /// Applies an entry assignment received from a peer.
    pub fn apply_remote_assign(
        &self,
        key: &str,
        value: Value,
        flags: EntryFlags,
        seq: SequenceNumber,
    ) -> RemoteApply {
        if key.is_empty() {
            return RemoteApply::Ignored;
        }
        let key = normalize_key(key);
        let mut entries = self.entries.write();

        let Some(entry) = entries.get_mut(&key) else {
            let entry = self.new_entry(key, value, flags, seq);
            let change = Change::from_entry(&entry, NotifyKind::NEW);
            entries.insert(entry.key.clone(), entry);
            return RemoteApply::Applied(vec![change]);
        };

        if entry.entry_type() != value.entry_type() {
            return RemoteApply::Applied(self.replace(entry, value, flags, seq));
        }
        if !self.accepts(seq, entry.seq) {
            return RemoteApply::Stale(entry.clone());
        }
        RemoteApply::Applied(self.overwrite(entry, value, flags, seq))
    }

    /// Applies an entry update received from a peer.
    ///
    /// Updates for unknown keys or of the wrong type are ignored.
    pub fn apply_remote_update(&self, key: &str, seq: SequenceNumber, value: Value) -> RemoteApply {
        if key.is_empty() {
            return RemoteApply::Ignored;
        }
        let key = normalize_key(key);
        let mut entries = self.entries.write();

        let Some(entry) = entries.get_mut(&key) else {
            return RemoteApply::Ignored;
        };
        if entry.entry_type() != value.entry_type() {
            return RemoteApply::Ignored;
        }
        if !self.accepts(seq, entry.seq) {
            return RemoteApply::Stale(entry.clone());
        }
        let flags = entry.flags;
        RemoteApply::Applied(self.overwrite(entry, value, flags, seq))
    }

    /// Applies a flags update received from a peer.
    pub fn apply_remote_flags(&self, key: &str, flags: EntryFlags) -> Vec<Change> {
        if key.is_empty() {
            return Vec::new();
        }
        self.update_flags(&normalize_key(key), flags, NotifyKind::NONE)
    }

    /// Applies an entry delete received from a peer.
    pub fn apply_remote_delete(&self, key: &str) -> Vec<Change> {
        if key.is_empty() {
            return Vec::new();
        }
        self.remove(&normalize_key(key), NotifyKind::NONE)
    }

    /// Applies a clear-all received from a peer.
    pub fn apply_remote_clear(&self) -> Vec<Change> {
        self.clear(NotifyKind::NONE)
    }

    /// Installs an entry from the server regardless of sequence numbers.
    ///
    /// Used while synchronizing with the server, which wins for every key
    /// it announces.
    pub fn apply_authoritative(
        &self,
        key: &str,
        value: Value,
        flags: EntryFlags,
        seq: SequenceNumber,
    ) -> Vec<Change> {
        if key.is_empty() {
            return Vec::new();
        }
        let key = normalize_key(key);
        let mut entries = self.entries.write();
        match entries.get_mut(&key) {
            None => {
                let entry = self.new_entry(key, value, flags, seq);
                let change = Change::from_entry(&entry, NotifyKind::NEW);
                entries.insert(entry.key.clone(), entry);
                vec![change]
            }
            Some(entry) if entry.entry_type() != value.entry_type() => {
                self.replace(entry, value, flags, seq)
            }
            Some(entry) => self.overwrite(entry, value, flags, seq),
        }
    }

    fn accepts(&self, incoming: SequenceNumber, current: SequenceNumber) -> bool {
        match self.policy {
            SequencePolicy::NotOlder => !incoming.is_older_than(current),
            SequencePolicy::StrictlyNewer => incoming.is_newer_than(current),
        }
    }

    fn new_entry(&self, key: String, value: Value, flags: EntryFlags, seq: SequenceNumber) -> Entry {
        Entry {
            key,
            value,
            flags,
            seq,
            last_change: self.clock.tick(),
        }
    }

    fn overwrite(
        &self,
        entry: &mut Entry,
        value: Value,
        flags: EntryFlags,
        seq: SequenceNumber,
    ) -> Vec<Change> {
        let mut kind = NotifyKind::NONE;
        if entry.value != value {
            entry.value = value;
            kind |= NotifyKind::UPDATE;
        }
        if entry.flags != flags {
            entry.flags = flags;
            kind |= NotifyKind::FLAGS;
        }
        entry.seq = seq;
        if kind == NotifyKind::NONE {
            return Vec::new();
        }
        entry.last_change = self.clock.tick();
        vec![Change::from_entry(entry, kind)]
    }

    fn replace(
        &self,
        entry: &mut Entry,
        value: Value,
        flags: EntryFlags,
        seq: SequenceNumber,
    ) -> Vec<Change> {
        let deleted = Change::from_entry(entry, NotifyKind::DELETE);
        *entry = self.new_entry(entry.key.clone(), value, flags, seq);
        vec![deleted, Change::from_entry(entry, NotifyKind::NEW)]
    }

    fn update_flags(&self, key: &str, flags: EntryFlags, origin: NotifyKind) -> Vec<Change> {
        let mut entries = self.entries.write();
        let Some(entry) = entries.get_mut(key) else {
            return Vec::new();
        };
        if entry.flags == flags {
            return Vec::new();
        }
        entry.flags = flags;
        entry.last_change = self.clock.tick();
        vec![Change::from_entry(entry, NotifyKind::FLAGS | origin)]
    }

    fn remove(&self, key: &str, origin: NotifyKind) -> Vec<Change> {
        let removed = self.entries.write().remove(key);
        removed
            .map(|entry| vec![Change::from_entry(&entry, NotifyKind::DELETE | origin)])
            .unwrap_or_default()
    }

    fn clear(&self, origin: NotifyKind) -> Vec<Change> {
        let mut entries = self.entries.write();
        let mut changes = Vec::new();
        entries.retain(|_, entry| {
            if entry.flags.is_persistent() {
                true
            } else {
                changes.push(Change::from_entry(entry, NotifyKind::DELETE | origin));
                false
            }
        });
        changes
    }
}

/// Rejects values a peer would refuse to decode or that cannot be framed.
fn check_size(key: &str, value: &Value) -> CoreResult<()> {
    let too_large = |source| CoreError::ValueTooLarge {
        key: key.to_string(),
        source,
    };
    value.check_limits().map_err(too_large)?;
    let len = entry_frame_len(key, value);
    if len > MAX_FRAME_LEN {
        return Err(too_large(CodecError::SizeLimitExceeded {
            claimed: len as u64,
            max_allowed: MAX_FRAME_LEN as u64,
        }));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nettable_codec::EntryType;

    fn seq(n: u16) -> SequenceNumber {
        SequenceNumber::new(n)
    }

    #[test]
    fn put_new_entry() {
        let store = EntryStore::new();
        let changes = store.put("speed", Value::Double(1.0), false).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].key, "/speed");
        assert_eq!(changes[0].kind, NotifyKind::NEW | NotifyKind::LOCAL);
        assert!(changes[0].is_local());

        let entry = store.get("/speed").unwrap();
        assert_eq!(entry.value, Value::Double(1.0));
        assert_eq!(entry.flags, EntryFlags::NONE);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn put_same_value_is_noop() {
        let store = EntryStore::new();
        store.put("/a", Value::Boolean(true), false).unwrap();
        let before = store.get("/a").unwrap();
        assert!(store.put("/a", Value::Boolean(true), false).unwrap().is_empty());
        assert_eq!(store.get("/a").unwrap(), before);
    }

    #[test]
    fn put_update_bumps_sequence_and_timestamp() {
        let store = EntryStore::new();
        store.put("/a", Value::Double(1.0), false).unwrap();
        let first = store.get("/a").unwrap();
        let changes = store.put("/a", Value::Double(2.0), false).unwrap();
        assert_eq!(changes[0].kind, NotifyKind::UPDATE | NotifyKind::LOCAL);

        let second = store.get("/a").unwrap();
        assert_eq!(second.seq, first.seq.next());
        assert!(second.last_change > first.last_change);
    }

    #[test]
    fn type_conflict_without_force() {
        let store = EntryStore::new();
        store.put("/a", Value::Double(1.0), false).unwrap();
        let err = store.put("/a", Value::String("x".into()), false).unwrap_err();
        assert_eq!(
            err,
            CoreError::TypeConflict {
                key: "/a".into(),
                existing: EntryType::Double,
                attempted: EntryType::String,
            }
        );
        assert_eq!(store.get_value("/a"), Some(Value::Double(1.0)));
    }

    #[test]
    fn oversized_values_are_rejected() {
        use nettable_codec::{MAX_ARRAY_ELEMENTS, MAX_BYTES_LENGTH};

        let store = EntryStore::new();
        store.put("/big", Value::Boolean(true), false).unwrap();

        let too_many = Value::BooleanArray(vec![true; MAX_ARRAY_ELEMENTS as usize + 1]);
        let err = store.put("/big", too_many, true).unwrap_err();
        assert!(matches!(
            err,
            CoreError::ValueTooLarge {
                ref key,
                source: CodecError::SizeLimitExceeded { .. },
            } if key == "/big"
        ));

        // Within the string limit, but not once the key and header are added
        let no_room = Value::Raw(vec![0; MAX_BYTES_LENGTH as usize]);
        assert!(matches!(
            store.put("/blob", no_room, false),
            Err(CoreError::ValueTooLarge { .. })
        ));

        assert_eq!(store.get_value("/big"), Some(Value::Boolean(true)));
        assert!(!store.contains("/blob"));
    }

    #[test]
    fn largest_array_is_accepted() {
        let store = EntryStore::new();
        let value = Value::BooleanArray(vec![true; nettable_codec::MAX_ARRAY_ELEMENTS as usize]);
        store.put("/big", value.clone(), false).unwrap();
        let bytes = nettable_codec::encode_value(&value);
        assert_eq!(nettable_codec::decode_value(&bytes).unwrap(), value);
    }

    #[test]
    fn type_change_with_force_is_delete_then_new() {
        let store = EntryStore::new();
        store.put("/a", Value::Double(1.0), false).unwrap();
        let changes = store.put("/a", Value::String("x".into()), true).unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].kind, NotifyKind::DELETE | NotifyKind::LOCAL);
        assert_eq!(changes[0].value, Value::Double(1.0));
        assert_eq!(changes[1].kind, NotifyKind::NEW | NotifyKind::LOCAL);
        assert_eq!(store.get_value("/a"), Some(Value::String("x".into())));
    }

    #[test]
    fn empty_key_is_rejected() {
        let store = EntryStore::new();
        assert_eq!(
            store.put("", Value::Boolean(true), false),
            Err(CoreError::InvalidKey)
        );
        assert_eq!(
            store.set_flags("", EntryFlags::PERSISTENT),
            Err(CoreError::InvalidKey)
        );
        assert!(store.delete("").is_empty());
        assert!(store.get("").is_none());
    }

    #[test]
    fn delete_reports_last_value() {
        let store = EntryStore::new();
        store.put("/a", Value::Double(3.0), false).unwrap();
        let changes = store.delete("a");
        assert_eq!(changes[0].kind, NotifyKind::DELETE | NotifyKind::LOCAL);
        assert_eq!(changes[0].value, Value::Double(3.0));
        assert!(store.delete("a").is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn set_flags_and_delete_all() {
        let store = EntryStore::new();
        store.put("/keep", Value::Double(1.0), false).unwrap();
        store.put("/drop", Value::Double(2.0), false).unwrap();

        let changes = store.set_flags("/keep", EntryFlags::PERSISTENT).unwrap();
        assert_eq!(changes[0].kind, NotifyKind::FLAGS | NotifyKind::LOCAL);
        assert!(store.set_flags("/keep", EntryFlags::PERSISTENT).unwrap().is_empty());
        assert!(store.set_flags("/missing", EntryFlags::PERSISTENT).unwrap().is_empty());

        let changes = store.delete_all();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].key, "/drop");
        assert!(store.contains("/keep"));
        assert_eq!(store.flags("/keep"), Some(EntryFlags::PERSISTENT));
    }

    #[test]
    fn list_by_prefix_is_a_snapshot() {
        let store = EntryStore::new();
        store.put("/a/x", Value::Double(1.0), false).unwrap();
        store.put("/a/y", Value::Boolean(true), false).unwrap();
        store.put("/b", Value::Double(2.0), false).unwrap();

        let listed = store.list("/a");
        store.put("/a/z", Value::Double(3.0), false).unwrap();
        let keys: Vec<String> = listed.map(|entry| entry.key).collect();
        assert_eq!(keys, vec!["/a/x", "/a/y"]);

        assert_eq!(store.list("").len(), 4);
        let doubles: Vec<String> = store
            .list_typed("/a", EntryType::Double.into())
            .map(|entry| entry.key)
            .collect();
        assert_eq!(doubles, vec!["/a/x", "/a/z"]);
    }

    #[test]
    fn remote_assign_creates_entry() {
        let store = EntryStore::new();
        let changes = store
            .apply_remote_assign("/r", Value::Double(1.0), EntryFlags::PERSISTENT, seq(4))
            .into_changes();
        assert_eq!(changes[0].kind, NotifyKind::NEW);
        assert!(!changes[0].is_local());
        let entry = store.get("/r").unwrap();
        assert_eq!(entry.seq, seq(4));
        assert!(entry.flags.is_persistent());
    }

    #[test]
    fn client_accepts_equal_sequence() {
        let store = EntryStore::new();
        store.apply_remote_assign("/r", Value::Double(1.0), EntryFlags::NONE, seq(5));
        let outcome = store.apply_remote_update("/r", seq(5), Value::Double(2.0));
        assert_eq!(outcome.into_changes()[0].kind, NotifyKind::UPDATE);

        let stale = store.apply_remote_update("/r", seq(4), Value::Double(3.0));
        assert!(matches!(stale, RemoteApply::Stale(entry) if entry.value == Value::Double(2.0)));
    }

    #[test]
    fn server_requires_strictly_newer() {
        let store = EntryStore::authoritative();
        store.apply_remote_assign("/r", Value::Double(1.0), EntryFlags::NONE, seq(5));

        let stale = store.apply_remote_update("/r", seq(5), Value::Double(2.0));
        assert!(matches!(stale, RemoteApply::Stale(_)));
        assert_eq!(store.get_value("/r"), Some(Value::Double(1.0)));

        let applied = store.apply_remote_update("/r", seq(6), Value::Double(2.0));
        assert!(matches!(applied, RemoteApply::Applied(ref c) if c.len() == 1));
    }

    #[test]
    fn remote_update_of_unknown_or_mistyped_entry_is_ignored() {
        let store = EntryStore::new();
        assert_eq!(
            store.apply_remote_update("/none", seq(1), Value::Double(1.0)),
            RemoteApply::Ignored
        );
        store.put("/d", Value::Double(1.0), false).unwrap();
        assert_eq!(
            store.apply_remote_update("/d", seq(9), Value::Boolean(true)),
            RemoteApply::Ignored
        );
    }

    #[test]
    fn remote_assign_with_new_type_replaces() {
        let store = EntryStore::authoritative();
        store.put("/d", Value::Double(1.0), false).unwrap();
        let changes = store
            .apply_remote_assign("/d", Value::Boolean(true), EntryFlags::NONE, seq(0))
            .into_changes();
        assert_eq!(changes[0].kind, NotifyKind::DELETE);
        assert_eq!(changes[1].kind, NotifyKind::NEW);
    }

    #[test]
    fn remote_assign_reports_value_and_flag_changes_together() {
        let store = EntryStore::new();
        store.apply_remote_assign("/r", Value::Double(1.0), EntryFlags::NONE, seq(1));
        let changes = store
            .apply_remote_assign("/r", Value::Double(2.0), EntryFlags::PERSISTENT, seq(2))
            .into_changes();
        assert_eq!(changes[0].kind, NotifyKind::UPDATE | NotifyKind::FLAGS);
    }

    #[test]
    fn authoritative_wins_over_newer_local() {
        let store = EntryStore::new();
        store.put("/a", Value::Double(1.0), false).unwrap();
        for n in 2..10 {
            store.put("/a", Value::Double(f64::from(n)), false).unwrap();
        }
        let changes = store.apply_authoritative("/a", Value::Double(0.5), EntryFlags::NONE, seq(0));
        assert_eq!(changes[0].kind, NotifyKind::UPDATE);
        assert_eq!(store.get("/a").unwrap().seq, seq(0));
    }

    #[test]
    fn remote_flags_delete_and_clear() {
        let store = EntryStore::new();
        store.apply_remote_assign("/p", Value::Double(1.0), EntryFlags::NONE, seq(0));
        store.apply_remote_assign("/q", Value::Double(1.0), EntryFlags::NONE, seq(0));
        store.apply_remote_assign("/r", Value::Double(1.0), EntryFlags::NONE, seq(0));

        let changes = store.apply_remote_flags("/p", EntryFlags::PERSISTENT);
        assert_eq!(changes[0].kind, NotifyKind::FLAGS);

        let changes = store.apply_remote_delete("/q");
        assert_eq!(changes[0].kind, NotifyKind::DELETE);

        let changes = store.apply_remote_clear();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].key, "/r");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn concurrent_puts() {
        let store = std::sync::Arc::new(EntryStore::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        store
                            .put(&format!("/t{t}/{i}"), Value::Double(f64::from(i)), false)
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len(), 400);
        assert_eq!(store.list("/t2").len(), 100);
    }
}
