//! Property-based test generators using proptest.
//!
//! Provides strategies for values, keys and protocol messages, plus a
//! small operation model for driving an [`EntryStore`].

use nettable_codec::Value;
use nettable_core::{EntryFlags, EntryStore};
use nettable_sync_protocol::{Message, SequenceNumber};
use proptest::prelude::*;

/// Strategy for values of every type.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Boolean),
        any::<f64>().prop_map(Value::Double),
        ".{0,32}".prop_map(Value::String),
        prop::collection::vec(any::<u8>(), 0..64).prop_map(Value::Raw),
        prop::collection::vec(any::<bool>(), 0..16).prop_map(Value::BooleanArray),
        prop::collection::vec(any::<f64>(), 0..16).prop_map(Value::DoubleArray),
        prop::collection::vec(".{0,8}", 0..8).prop_map(Value::StringArray),
        prop::collection::vec(any::<u8>(), 0..64).prop_map(Value::Rpc),
    ]
}

/// Strategy for scalar values (boolean, double, string).
pub fn scalar_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Boolean),
        (-1.0e6f64..1.0e6).prop_map(Value::Double),
        "[a-z]{0,12}".prop_map(Value::String),
    ]
}

/// Strategy for keys, with or without the leading separator.
pub fn key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("/?[a-z]{1,6}(/[a-z0-9_]{1,6}){0,3}").expect("Invalid regex")
}

/// Strategy for sequence numbers across the whole range.
pub fn sequence_strategy() -> impl Strategy<Value = SequenceNumber> {
    any::<u16>().prop_map(SequenceNumber::new)
}

/// Strategy for entry messages (assign, update, flags, delete, clear).
pub fn entry_message_strategy() -> impl Strategy<Value = Message> {
    prop_oneof![
        (key_strategy(), sequence_strategy(), any::<u8>(), value_strategy()).prop_map(
            |(key, seq, flags, value)| Message::EntryAssign {
                key,
                seq,
                flags,
                value,
            }
        ),
        (key_strategy(), sequence_strategy(), value_strategy())
            .prop_map(|(key, seq, value)| Message::EntryUpdate { key, seq, value }),
        (key_strategy(), any::<u8>()).prop_map(|(key, flags)| Message::FlagsUpdate { key, flags }),
        key_strategy().prop_map(|key| Message::EntryDelete { key }),
        Just(Message::clear_entries()),
    ]
}

/// Strategy for any protocol message.
pub fn message_strategy() -> impl Strategy<Value = Message> {
    prop_oneof![
        Just(Message::KeepAlive),
        Just(Message::ServerHelloDone),
        Just(Message::ClientHelloDone),
        (any::<u16>(), ".{0,16}").prop_map(|(protocol_version, identity)| {
            Message::ClientHello {
                protocol_version,
                identity,
            }
        }),
        (any::<u8>(), ".{0,16}")
            .prop_map(|(flags, identity)| Message::ServerHello { flags, identity }),
        any::<u16>().prop_map(|supported_version| Message::ProtocolUnsupported {
            supported_version
        }),
        entry_message_strategy(),
    ]
}

/// A local operation against an entry store.
#[derive(Debug, Clone)]
pub enum StoreOperation {
    /// Write a value
    Put {
        /// Entry key
        key: String,
        /// New value
        value: Value,
        /// Replace on type change
        force: bool,
    },
    /// Delete an entry
    Delete {
        /// Entry key
        key: String,
    },
    /// Toggle the persistent flag
    SetPersistent {
        /// Entry key
        key: String,
        /// Flag state
        persistent: bool,
    },
    /// Delete every non-persistent entry
    DeleteAll,
}

impl StoreOperation {
    /// Applies the operation, ignoring rejected writes.
    pub fn apply(&self, store: &EntryStore) {
        match self {
            StoreOperation::Put { key, value, force } => {
                let _ = store.put(key, value.clone(), *force);
            }
            StoreOperation::Delete { key } => {
                store.delete(key);
            }
            StoreOperation::SetPersistent { key, persistent } => {
                let flags = if *persistent {
                    EntryFlags::PERSISTENT
                } else {
                    EntryFlags::NONE
                };
                let _ = store.set_flags(key, flags);
            }
            StoreOperation::DeleteAll => {
                store.delete_all();
            }
        }
    }
}

/// Strategy for store operations over a small key space, so that
/// operations collide often.
pub fn store_operation_strategy() -> impl Strategy<Value = StoreOperation> {
    let key = "/?[abc]";
    prop_oneof![
        6 => (key, scalar_value_strategy(), any::<bool>())
            .prop_map(|(key, value, force)| StoreOperation::Put { key, value, force }),
        2 => key.prop_map(|key| StoreOperation::Delete { key }),
        1 => (key, any::<bool>())
            .prop_map(|(key, persistent)| StoreOperation::SetPersistent { key, persistent }),
        1 => Just(StoreOperation::DeleteAll),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use nettable_codec::{Decode, Encode};

    proptest! {
        #[test]
        fn messages_roundtrip(message in message_strategy()) {
            let bytes = message.encode();
            prop_assert_eq!(Message::decode(&bytes).unwrap(), message);
        }

        #[test]
        fn store_keys_stay_normalized(ops in prop::collection::vec(store_operation_strategy(), 0..64)) {
            let store = EntryStore::new();
            for op in &ops {
                op.apply(&store);
            }
            let entries: Vec<_> = store.list("").collect();
            prop_assert_eq!(entries.len(), store.len());
            for entry in entries {
                prop_assert!(entry.key.starts_with('/'));
                prop_assert!(!entry.key.starts_with("//"));
            }
        }

        #[test]
        fn delete_all_keeps_only_persistent(ops in prop::collection::vec(store_operation_strategy(), 0..64)) {
            let store = EntryStore::new();
            for op in &ops {
                op.apply(&store);
            }
            store.delete_all();
            prop_assert!(store.list("").all(|entry| entry.flags.is_persistent()));
        }
    }
}
