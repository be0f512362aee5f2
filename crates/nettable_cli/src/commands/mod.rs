//! CLI command implementations.

pub mod get;
pub mod put;
pub mod serve;
pub mod watch;

use clap::ValueEnum;
use nettable_codec::Value;
use nettable_sync_engine::{ClientConfig, NetworkTable, SyncError};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors reported by the CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// The server did not complete the handshake in time.
    #[error("could not connect to {host}:{port} within {timeout:?}")]
    NotConnected {
        /// Server host.
        host: String,
        /// Server port.
        port: u16,
        /// How long the command waited.
        timeout: Duration,
    },

    /// The requested key does not exist.
    #[error("no entry at {0}")]
    MissingKey(String),

    /// A value argument could not be parsed.
    #[error("invalid {kind} value: {input:?}")]
    InvalidValue {
        /// Expected type.
        kind: &'static str,
        /// The argument as given.
        input: String,
    },

    /// Client error.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Server error.
    #[error(transparent)]
    Server(#[from] nettable_sync_server::ServerError),

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// One JSON object per line
    Json,
}

/// Value type accepted by `put`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ValueKind {
    /// true / false
    Bool,
    /// Double-precision number
    Number,
    /// UTF-8 string
    String,
}

/// Where client commands connect.
#[derive(Debug, Clone)]
pub struct Target {
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Identity announced to the server.
    pub identity: String,
}

impl Target {
    /// Connects a client and waits for the handshake.
    pub fn connect(&self, timeout_secs: f64) -> CliResult<NetworkTable> {
        let timeout = Duration::try_from_secs_f64(timeout_secs).unwrap_or(Duration::from_secs(2));
        let client = NetworkTable::new(ClientConfig::new(self.identity.clone()));
        client.connect(&self.host, self.port)?;

        let deadline = Instant::now() + timeout;
        while !client.is_connected() {
            if Instant::now() >= deadline {
                client.disconnect();
                return Err(CliError::NotConnected {
                    host: self.host.clone(),
                    port: self.port,
                    timeout,
                });
            }
            thread::sleep(Duration::from_millis(10));
        }
        tracing::debug!(host = %self.host, port = self.port, "connected");
        Ok(client)
    }
}

/// Formats a value for text output.
pub fn format_value(value: &Value) -> String {
    fn join<T: ToString>(items: &[T]) -> String {
        let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
        format!("[{}]", parts.join(", "))
    }

    match value {
        Value::Boolean(b) => b.to_string(),
        Value::Double(d) => d.to_string(),
        Value::String(s) => format!("{s:?}"),
        Value::Raw(bytes) | Value::Rpc(bytes) => {
            let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
            format!("0x{hex}")
        }
        Value::BooleanArray(items) => join(items),
        Value::DoubleArray(items) => join(items),
        Value::StringArray(items) => {
            let quoted: Vec<String> = items.iter().map(|s| format!("{s:?}")).collect();
            format!("[{}]", quoted.join(", "))
        }
    }
}

/// Converts a value to JSON. Byte values become arrays of numbers.
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Boolean(b) => serde_json::json!(b),
        Value::Double(d) => serde_json::json!(d),
        Value::String(s) => serde_json::json!(s),
        Value::Raw(bytes) | Value::Rpc(bytes) => serde_json::json!(bytes),
        Value::BooleanArray(items) => serde_json::json!(items),
        Value::DoubleArray(items) => serde_json::json!(items),
        Value::StringArray(items) => serde_json::json!(items),
    }
}
