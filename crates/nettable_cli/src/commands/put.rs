//! Put command implementation.

use super::{CliError, CliResult, Target, ValueKind};
use nettable_codec::Value;
use nettable_sync_engine::EntryFlags;

/// Parses a command-line argument as a value of `kind`.
pub fn parse_value(kind: ValueKind, input: &str) -> CliResult<Value> {
    let invalid = |kind| CliError::InvalidValue {
        kind,
        input: input.to_string(),
    };
    match kind {
        ValueKind::Bool => match input.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Value::Boolean(true)),
            "false" | "0" | "no" | "off" => Ok(Value::Boolean(false)),
            _ => Err(invalid("boolean")),
        },
        ValueKind::Number => input
            .trim()
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|_| invalid("number")),
        ValueKind::String => Ok(Value::String(input.to_string())),
    }
}

/// Runs the put command.
///
/// Disconnecting flushes the outbox, so the write is on the wire before
/// this returns.
pub fn run(
    target: &Target,
    key: &str,
    value: Value,
    force: bool,
    persistent: bool,
    timeout: f64,
) -> CliResult<()> {
    let client = target.connect(timeout)?;
    let result = client.put_value(key, value, force).and_then(|()| {
        if persistent {
            client.set_flags(key, EntryFlags::PERSISTENT)
        } else {
            Ok(())
        }
    });
    client.disconnect();
    result?;
    tracing::info!(key, "entry written");
    Ok(())
}
