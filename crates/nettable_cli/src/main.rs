//! NetTable CLI
//!
//! Command-line client and server for NetTable.
//!
//! # Commands
//!
//! - `serve` - Run a table server
//! - `get` - Print the value of one entry
//! - `put` - Write one entry
//! - `watch` - Print entry changes as they arrive

mod commands;

use clap::{Parser, Subcommand};
use commands::{OutputFormat, ValueKind};
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

/// NetTable command-line tools.
#[derive(Parser)]
#[command(name = "nettable")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Server host to connect to
    #[arg(global = true, long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to connect to
    #[arg(global = true, long, default_value_t = 1735)]
    port: u16,

    /// Identity announced to the server
    #[arg(global = true, long, default_value = "nettable-cli")]
    identity: String,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a table server until interrupted
    Serve {
        /// Address to listen on
        #[arg(short, long, default_value = "0.0.0.0:1735")]
        bind: SocketAddr,

        /// Maximum concurrent peers
        #[arg(long, default_value_t = 64)]
        max_connections: usize,
    },

    /// Print the value of one entry
    Get {
        /// Entry key
        key: String,

        /// Seconds to wait for the connection
        #[arg(short, long, default_value_t = 2.0)]
        timeout: f64,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Write one entry
    Put {
        /// Entry key
        key: String,

        /// Value, parsed according to --type
        value: String,

        /// Value type
        #[arg(short = 't', long = "type", value_enum, default_value_t = ValueKind::String)]
        kind: ValueKind,

        /// Replace an existing entry of another type
        #[arg(long)]
        force: bool,

        /// Mark the entry persistent
        #[arg(long)]
        persistent: bool,

        /// Seconds to wait for the connection
        #[arg(long, default_value_t = 2.0)]
        timeout: f64,
    },

    /// Print entry changes as they arrive
    Watch {
        /// Key prefix to watch
        #[arg(default_value = "/")]
        prefix: String,

        /// Skip the entries that exist when the watch starts
        #[arg(long)]
        changes_only: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let target = commands::Target {
        host: cli.host,
        port: cli.port,
        identity: cli.identity,
    };

    match cli.command {
        Commands::Serve {
            bind,
            max_connections,
        } => {
            commands::serve::run(bind, max_connections)?;
        }
        Commands::Get {
            key,
            timeout,
            format,
        } => {
            commands::get::run(&target, &key, timeout, format)?;
        }
        Commands::Put {
            key,
            value,
            kind,
            force,
            persistent,
            timeout,
        } => {
            let value = commands::put::parse_value(kind, &value)?;
            commands::put::run(&target, &key, value, force, persistent, timeout)?;
        }
        Commands::Watch {
            prefix,
            changes_only,
            format,
        } => {
            commands::watch::run(&target, &prefix, !changes_only, format)?;
        }
    }

    Ok(())
}
