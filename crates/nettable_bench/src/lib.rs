//! Benchmark support for NetTable.

#![warn(missing_docs)]

pub mod utils;
