//! Watch command implementation.

use super::{format_value, value_to_json, CliResult, OutputFormat, Target};
use nettable_sync_engine::{ConnectionNotification, EntryNotification, NetworkTable, NotifyKind};

fn kind_label(kind: NotifyKind) -> &'static str {
    if kind.contains(NotifyKind::IMMEDIATE) {
        "existing"
    } else if kind.contains(NotifyKind::NEW) {
        "new"
    } else if kind.contains(NotifyKind::DELETE) {
        "deleted"
    } else if kind.contains(NotifyKind::UPDATE) {
        "updated"
    } else {
        "flags"
    }
}

fn print_entry(format: OutputFormat, n: &EntryNotification) {
    match format {
        OutputFormat::Text => {
            let persistent = if n.flags.is_persistent() { " (persistent)" } else { "" };
            println!(
                "{:<8} {} = {}{}",
                kind_label(n.kind),
                n.key,
                format_value(&n.value),
                persistent
            );
        }
        OutputFormat::Json => {
            let line = serde_json::json!({
                "event": kind_label(n.kind),
                "key": n.key,
                "value": value_to_json(&n.value),
                "persistent": n.flags.is_persistent(),
            });
            println!("{line}");
        }
    }
}

fn print_connection(format: OutputFormat, n: &ConnectionNotification) {
    match format {
        OutputFormat::Text if n.connected => println!(
            "# connected to {} at {}:{}",
            n.info.remote_id, n.info.remote_ip, n.info.remote_port
        ),
        OutputFormat::Text => println!("# disconnected"),
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "event": if n.connected { "connected" } else { "disconnected" } })
        ),
    }
}

/// Runs the watch command until Ctrl-C. Reconnects on its own when the
/// server goes away.
pub fn run(target: &Target, prefix: &str, existing: bool, format: OutputFormat) -> CliResult<()> {
    let client = NetworkTable::new(nettable_sync_engine::ClientConfig::new(
        target.identity.clone(),
    ));
    client.add_connection_listener(move |n| print_connection(format, n), true);

    let mut mask = NotifyKind::NEW
        | NotifyKind::DELETE
        | NotifyKind::UPDATE
        | NotifyKind::FLAGS
        | NotifyKind::LOCAL;
    if existing {
        mask |= NotifyKind::IMMEDIATE;
    }
    client.add_entry_listener(prefix, mask, move |n| print_entry(format, n));
    client.connect(&target.host, target.port)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(tokio::signal::ctrl_c())?;
    client.disconnect();
    Ok(())
}
