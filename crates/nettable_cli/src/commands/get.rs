//! Get command implementation.

use super::{format_value, value_to_json, CliError, CliResult, OutputFormat, Target};
use serde::Serialize;

/// Entry as printed by `get --format json`.
#[derive(Debug, Serialize)]
pub struct EntryOutput {
    /// Entry key.
    pub key: String,
    /// Type name.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Value.
    pub value: serde_json::Value,
    /// Persistent flag.
    pub persistent: bool,
    /// Sequence number.
    pub seq: u16,
}

/// Runs the get command.
pub fn run(target: &Target, key: &str, timeout: f64, format: OutputFormat) -> CliResult<()> {
    let client = target.connect(timeout)?;
    let entry = client.get_entry(key);
    client.disconnect();
    let entry = entry.ok_or_else(|| CliError::MissingKey(key.to_string()))?;

    match format {
        OutputFormat::Text => println!("{}", format_value(&entry.value)),
        OutputFormat::Json => {
            let output = EntryOutput {
                kind: entry.entry_type().name(),
                value: value_to_json(&entry.value),
                persistent: entry.flags.is_persistent(),
                seq: entry.seq.value(),
                key: entry.key,
            };
            println!("{}", serde_json::to_string(&output).unwrap_or_default());
        }
    }
    Ok(())
}
