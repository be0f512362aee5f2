//! Entries and change records.

use crate::flags::EntryFlags;
use crate::notify::NotifyKind;
use nettable_codec::{EntryType, Value};
use nettable_sync_protocol::{Message, SequenceNumber};

/// A single key/value entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Normalized key.
    pub key: String,
    /// Current value. The type is fixed once assigned.
    pub value: Value,
    /// Entry flags.
    pub flags: EntryFlags,
    /// Sequence number of the last write.
    pub seq: SequenceNumber,
    /// Microseconds since the Unix epoch of the last change.
    pub last_change: u64,
}

impl Entry {
    /// Returns the entry's type.
    pub fn entry_type(&self) -> EntryType {
        self.value.entry_type()
    }
}

/// One observable change produced by a store mutation.
///
/// The store returns these instead of calling listeners; the caller
/// dispatches them once the store lock is released.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    /// Normalized key.
    pub key: String,
    /// Value after the change, or the last value for a delete.
    pub value: Value,
    /// Flags after the change.
    pub flags: EntryFlags,
    /// Sequence number after the change.
    pub seq: SequenceNumber,
    /// What changed. Carries `LOCAL` for changes made through the local API.
    pub kind: NotifyKind,
}

impl Change {
    pub(crate) fn from_entry(entry: &Entry, kind: NotifyKind) -> Self {
        Self {
            key: entry.key.clone(),
            value: entry.value.clone(),
            flags: entry.flags,
            seq: entry.seq,
            kind,
        }
    }

    /// Returns true for changes made through the local API.
    pub fn is_local(&self) -> bool {
        self.kind.contains(NotifyKind::LOCAL)
    }

    /// The messages that announce this change to a peer.
    pub fn to_messages(&self) -> Vec<Message> {
        let key = self.key.clone();
        if self.kind.contains(NotifyKind::DELETE) {
            return vec![Message::EntryDelete { key }];
        }
        if self.kind.contains(NotifyKind::NEW) {
            return vec![Message::EntryAssign {
                key,
                seq: self.seq,
                flags: self.flags.bits(),
                value: self.value.clone(),
            }];
        }
        let mut messages = Vec::with_capacity(2);
        if self.kind.contains(NotifyKind::UPDATE) {
            messages.push(Message::EntryUpdate {
                key: key.clone(),
                seq: self.seq,
                value: self.value.clone(),
            });
        }
        if self.kind.contains(NotifyKind::FLAGS) {
            messages.push(Message::FlagsUpdate {
                key,
                flags: self.flags.bits(),
            });
        }
        messages
    }
}

/// Iterator over a snapshot of entries.
///
/// The snapshot is taken when the iterator is created; later mutations of
/// the store are not observed.
#[derive(Debug)]
pub struct Entries {
    inner: std::vec::IntoIter<Entry>,
}

impl Entries {
    pub(crate) fn new(entries: Vec<Entry>) -> Self {
        Self {
            inner: entries.into_iter(),
        }
    }
}

impl Iterator for Entries {
    type Item = Entry;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Entries {}

impl DoubleEndedIterator for Entries {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(kind: NotifyKind) -> Change {
        Change {
            key: "/k".into(),
            value: Value::Double(1.0),
            flags: EntryFlags::PERSISTENT,
            seq: SequenceNumber::new(3),
            kind,
        }
    }

    #[test]
    fn messages_for_each_kind() {
        assert_eq!(
            change(NotifyKind::DELETE | NotifyKind::LOCAL).to_messages(),
            vec![Message::EntryDelete { key: "/k".into() }]
        );
        assert!(matches!(
            change(NotifyKind::NEW).to_messages()[..],
            [Message::EntryAssign { flags: 0x01, .. }]
        ));
        assert_eq!(change(NotifyKind::UPDATE | NotifyKind::FLAGS).to_messages().len(), 2);
        assert!(change(NotifyKind::NONE).to_messages().is_empty());
    }

    #[test]
    fn entries_snapshot_is_exact_size() {
        let entries = Entries::new(Vec::new());
        assert_eq!(entries.len(), 0);
    }
}
