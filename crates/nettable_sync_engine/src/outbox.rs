//! Pending outgoing messages.

use nettable_core::Change;
use nettable_sync_protocol::Message;

/// Queue of messages waiting for the next flush.
///
/// Repeated writes to a key collapse: a newer value replaces a pending
/// update in place, or is folded into a pending assign. Messages for
/// different keys keep their relative order. Nothing collapses across a
/// queued clear-all, since the write must reach the server after it.
#[derive(Debug, Default)]
pub(crate) struct Outbox {
    messages: Vec<Message>,
}

impl Outbox {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.messages.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.messages.clear();
    }

    /// Removes and returns everything queued.
    pub(crate) fn take(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.messages)
    }

    pub(crate) fn push(&mut self, message: Message) {
        let pending = message.key().and_then(|key| {
            self.messages
                .iter()
                .enumerate()
                .rev()
                .take_while(|(_, m)| m.key().is_some())
                .find(|(_, m)| m.key() == Some(key))
                .map(|(index, _)| index)
        });
        let Some(index) = pending else {
            self.messages.push(message);
            return;
        };

        let leftover = match (&mut self.messages[index], message) {
            (
                Message::EntryUpdate { seq, value, .. },
                Message::EntryUpdate {
                    seq: new_seq,
                    value: new_value,
                    ..
                },
            )
            | (
                Message::EntryAssign { seq, value, .. },
                Message::EntryUpdate {
                    seq: new_seq,
                    value: new_value,
                    ..
                },
            ) => {
                *seq = new_seq;
                *value = new_value;
                None
            }
            (
                Message::EntryAssign { flags, .. },
                Message::FlagsUpdate {
                    flags: new_flags, ..
                },
            )
            | (
                Message::FlagsUpdate { flags, .. },
                Message::FlagsUpdate {
                    flags: new_flags, ..
                },
            ) => {
                *flags = new_flags;
                None
            }
            (_, message) => Some(message),
        };
        if let Some(message) = leftover {
            self.messages.push(message);
        }
    }

    /// Queues the messages for a batch of local changes.
    pub(crate) fn extend_from_changes(&mut self, changes: &[Change]) {
        for message in changes.iter().flat_map(Change::to_messages) {
            self.push(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nettable_codec::Value;
    use nettable_core::{EntryFlags, EntryStore};
    use nettable_sync_protocol::SequenceNumber;

    fn update(key: &str, seq: u16, value: f64) -> Message {
        Message::EntryUpdate {
            key: key.into(),
            seq: SequenceNumber::new(seq),
            value: Value::Double(value),
        }
    }

    #[test]
    fn updates_to_same_key_coalesce_in_place() {
        let mut outbox = Outbox::new();
        outbox.push(update("/a", 1, 1.0));
        outbox.push(update("/b", 1, 1.0));
        outbox.push(update("/a", 2, 2.0));

        let messages = outbox.take();
        assert_eq!(messages, vec![update("/a", 2, 2.0), update("/b", 1, 1.0)]);
        assert!(outbox.is_empty());
    }

    #[test]
    fn update_folds_into_pending_assign() {
        let store = EntryStore::new();
        let mut outbox = Outbox::new();
        outbox.extend_from_changes(&store.put("/a", Value::Double(1.0), false).unwrap());
        outbox.extend_from_changes(&store.put("/a", Value::Double(2.0), false).unwrap());
        outbox.extend_from_changes(&store.put("/a", Value::Double(3.0), false).unwrap());

        assert_eq!(outbox.len(), 1);
        match &outbox.take()[0] {
            Message::EntryAssign { seq, value, .. } => {
                assert_eq!(*value, Value::Double(3.0));
                assert_eq!(*seq, SequenceNumber::new(2));
            }
            other => panic!("expected assign, got {other:?}"),
        }
    }

    #[test]
    fn delete_breaks_coalescing() {
        let mut outbox = Outbox::new();
        outbox.push(update("/a", 1, 1.0));
        outbox.push(Message::EntryDelete { key: "/a".into() });
        outbox.push(update("/a", 2, 2.0));
        assert_eq!(outbox.len(), 3);
    }

    #[test]
    fn forced_type_change_is_delete_then_assign() {
        let store = EntryStore::new();
        store.put("/a", Value::Double(1.0), false).unwrap();
        let mut outbox = Outbox::new();
        outbox.extend_from_changes(&store.put("/a", Value::Boolean(true), true).unwrap());

        let messages = outbox.take();
        assert!(matches!(messages[0], Message::EntryDelete { .. }));
        assert!(matches!(
            messages[1],
            Message::EntryAssign {
                value: Value::Boolean(true),
                ..
            }
        ));
    }

    #[test]
    fn flags_fold_into_assign() {
        let mut outbox = Outbox::new();
        outbox.push(Message::EntryAssign {
            key: "/a".into(),
            seq: SequenceNumber::new(0),
            flags: 0,
            value: Value::Double(1.0),
        });
        outbox.push(Message::FlagsUpdate {
            key: "/a".into(),
            flags: 1,
        });
        assert_eq!(outbox.len(), 1);
        assert!(matches!(outbox.take()[0], Message::EntryAssign { flags: 1, .. }));
    }

    #[test]
    fn nothing_collapses_across_clear_all() {
        let store = EntryStore::new();
        let mut outbox = Outbox::new();
        store.put("/a", Value::Double(1.0), false).unwrap();

        outbox.extend_from_changes(&store.set_flags("/a", EntryFlags::PERSISTENT).unwrap());
        store.delete_all();
        outbox.push(Message::clear_entries());
        outbox.extend_from_changes(&store.set_flags("/a", EntryFlags::NONE).unwrap());

        assert!(store.contains("/a"));
        assert_eq!(
            outbox.take(),
            vec![
                Message::FlagsUpdate {
                    key: "/a".into(),
                    flags: EntryFlags::PERSISTENT.bits(),
                },
                Message::clear_entries(),
                Message::FlagsUpdate {
                    key: "/a".into(),
                    flags: 0,
                },
            ]
        );
    }

    #[test]
    fn update_after_clear_all_stays_behind_it() {
        let mut outbox = Outbox::new();
        outbox.push(update("/a", 1, 1.0));
        outbox.push(Message::clear_entries());
        outbox.push(update("/a", 2, 2.0));
        outbox.push(update("/a", 3, 3.0));
        assert_eq!(
            outbox.take(),
            vec![
                update("/a", 1, 1.0),
                Message::clear_entries(),
                update("/a", 3, 3.0),
            ]
        );
    }
}
