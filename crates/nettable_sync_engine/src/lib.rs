//! # NetTable Sync Engine
//!
//! Client side of NetTable: connection management and synchronization.
//!
//! This crate provides:
//! - `NetworkTable`, the client facade
//! - Background connection with handshake, keep-alive and reconnection
//! - Outbox batching of local writes, flushed at the update rate
//!
//! ## Architecture
//!
//! ```text
//!  application threads          network thread (tokio)      dispatch thread
//!  ───────────────────          ──────────────────────      ───────────────
//!  put / delete ──▶ EntryStore ──▶ outbox ──flush──▶ socket
//!                       ▲                                │
//!                       └──── apply inbound frames ◀─────┘
//!                       │
//!                       └──── changes ──────────────────▶ listeners
//! ```
//!
//! ## Key Invariants
//!
//! - The server is authoritative; on connect its entries replace local ones
//! - Nothing is queued while disconnected; the handshake resynchronizes
//! - Listener callbacks never run while the store is locked

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod config;
mod connection;
mod error;
mod outbox;
mod state;
mod transport;

pub use client::NetworkTable;
pub use config::{clamp_update_rate, ClientConfig, RetryConfig, MAX_UPDATE_RATE, MIN_UPDATE_RATE};
pub use error::{SyncError, SyncResult};
pub use state::ConnectionState;

pub use nettable_codec::Value;
pub use nettable_core::{
    ConnectionInfo, ConnectionNotification, CoreError, Entries, Entry, EntryFlags,
    EntryNotification, ListenerId, NotifyKind,
};
