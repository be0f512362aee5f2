//! # NetTable Sync Server
//!
//! The authoritative host of a NetTable.
//!
//! Peers connect over TCP, perform the handshake and receive the full
//! table. From then on every write a peer makes is applied to the
//! server's store and, if it wins on sequence number, forwarded to all
//! other peers. A losing writer is sent the current value instead, so
//! every peer converges on the server's copy.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       TableServer                        │
//! │  ┌────────────────┐   ┌────────────────────────────────┐ │
//! │  │ accept loop    │──▶│ session per peer               │ │
//! │  │ (tokio thread) │   │ handshake, read, fan-out queue │ │
//! │  └────────────────┘   └───────────────┬────────────────┘ │
//! │                                       ▼                  │
//! │                     ┌──────────────────────────────────┐ │
//! │                     │ authoritative EntryStore         │ │
//! │                     └──────────────────────────────────┘ │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use nettable_sync_server::{ServerConfig, TableServer};
//! use nettable_codec::Value;
//!
//! let server = TableServer::start(ServerConfig::default())?;
//! server.put_value("/robot/mode", Value::String("auto".into()), false)?;
//! println!("listening on {}", server.local_addr());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod error;
mod handler;
mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::TableServer;
