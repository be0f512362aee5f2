//! # NetTable Core
//!
//! Local state of a NetTable peer.
//!
//! This crate provides:
//! - `EntryStore`, the thread-safe cache of entries
//! - Key normalization and entry flags
//! - `Dispatcher`, which delivers entry and connection notifications
//!
//! The store returns the changes each mutation produced instead of calling
//! listeners; callers hand them to the dispatcher once the store lock is
//! released.
//!
//! ```
//! use nettable_core::{Dispatcher, EntryStore, NotifyKind};
//! use nettable_codec::Value;
//!
//! let store = EntryStore::new();
//! let dispatcher = Dispatcher::new();
//! dispatcher.add_entry_listener(&store, "/", NotifyKind::NEW | NotifyKind::LOCAL, |n| {
//!     println!("{} = {}", n.key, n.value);
//! });
//! let changes = store.put("speed", Value::Double(3.5), false).unwrap();
//! dispatcher.notify_entries(changes);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod clock;
mod dispatcher;
mod entry;
mod error;
mod flags;
mod key;
mod notify;
mod store;

pub use clock::{now_micros, MonotonicClock};
pub use dispatcher::{
    ConnectionInfo, ConnectionNotification, Dispatcher, EntryNotification, ListenerId,
};
pub use entry::{Change, Entries, Entry};
pub use error::{CoreError, CoreResult};
pub use flags::EntryFlags;
pub use key::{normalize_key, validate_key, PATH_SEPARATOR};
pub use notify::NotifyKind;
pub use store::{EntryStore, RemoteApply, SequencePolicy};
