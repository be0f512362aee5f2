//! # NetTable Testkit
//!
//! Test utilities for NetTable.
//!
//! This crate provides:
//! - Property-based test generators using proptest
//! - Loopback fixtures: a server on an ephemeral port and fast clients
//! - Wire test vectors with their expected encodings
//!
//! ## Usage
//!
//! ```rust,ignore
//! use nettable_testkit::prelude::*;
//!
//! #[test]
//! fn value_reaches_peer() {
//!     let server = start_server();
//!     let a = connected_client(&server, "a");
//!     let b = connected_client(&server, "b");
//!     a.put_boolean("/x", true, false).unwrap();
//!     assert!(wait_for(DEFAULT_WAIT, || b.get_boolean("/x", false)));
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::vectors::*;
}

pub use fixtures::*;
pub use generators::*;
pub use vectors::*;
