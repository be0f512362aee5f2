//! Serve command implementation.

use super::CliResult;
use nettable_sync_server::{ServerConfig, TableServer};
use std::net::SocketAddr;

/// Runs a table server until Ctrl-C.
pub fn run(bind: SocketAddr, max_connections: usize) -> CliResult<()> {
    let config = ServerConfig::new(bind).with_max_connections(max_connections);
    let mut server = TableServer::start(config)?;
    println!("Serving on {}", server.local_addr());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(tokio::signal::ctrl_c())?;

    println!(
        "Shutting down ({} peers, {} entries)",
        server.peer_count(),
        server.entry_count()
    );
    server.shutdown();
    Ok(())
}
