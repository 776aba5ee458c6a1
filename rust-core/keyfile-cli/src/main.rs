// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//!
//! keyfile — inspect and edit a file-per-key storage directory.
//!
//! Opens the directory through the same engine applications use, so keys are
//! encoded, initialized and reported exactly as they would be at runtime.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use keyfile_storage::normalize::normalize;
use keyfile_storage::{Encoding, FileStorageEngine, Logger, StorageConfig};

/// Version string, pulled from Cargo.toml at compile time.
const VERSION: &str = env!("CARGO_PKG_VERSION");

// ---------------------------------------------------------------------------
// CLI argument parsing
// ---------------------------------------------------------------------------

/// keyfile — inspect a keyfile storage directory.
#[derive(Parser, Debug)]
#[command(name = "keyfile", version = VERSION, about = "Inspect a keyfile storage directory")]
struct Cli {
    /// Storage directory. Defaults to <documents>/keyfile-store.
    #[arg(long, env = "KEYFILE_PATH")]
    path: Option<PathBuf>,

    /// Treat values as base64 and store raw bytes.
    #[arg(long)]
    binary: bool,

    /// Enable engine debug traces.
    #[arg(long, env = "KEYFILE_DEBUG")]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the value stored under a key.
    Get {
        key: String,
        /// Pretty-print nested JSON.
        #[arg(long)]
        pretty: bool,
    },
    /// Store a value under a key.
    Set { key: String, value: String },
    /// Remove a key.
    Rm { key: String },
    /// List every stored key.
    Keys,
    /// Report whether a key is stored.
    Exists { key: String },
    /// Remove every key.
    Clear,
    /// Log every stored value through the debug channel.
    Dump,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut builder = StorageConfig::builder()
        .debug(cli.debug || matches!(cli.command, Command::Dump))
        .encoding(if cli.binary {
            Encoding::Binary
        } else {
            Encoding::Text
        });
    if let Some(path) = &cli.path {
        builder = builder.storage_path(path);
    }
    if matches!(cli.command, Command::Dump) {
        // Dumped values go to stdout regardless of the tracing filter.
        builder = builder.logger(Logger::new(
            |message| println!("{message}"),
            |message| tracing::error!("{message}"),
        ));
    }
    let config = builder.build();
    tracing::debug!(path = config.storage_path(), "opening store");

    let engine = FileStorageEngine::new(config);
    engine
        .wait_ready()
        .await
        .context("storage directory could not be initialized")?;

    match cli.command {
        Command::Get { key, pretty } => {
            let value = engine.get_item(&key).await?;
            if pretty {
                println!("{}", serde_json::to_string_pretty(&normalize(&value))?);
            } else {
                println!("{value}");
            }
        }
        Command::Set { key, value } => {
            engine.set_item(&key, &value).await?;
        }
        Command::Rm { key } => {
            engine.remove_item(&key).await?;
        }
        Command::Keys => {
            for key in engine.get_all_keys().await? {
                println!("{key}");
            }
        }
        Command::Exists { key } => {
            let exists = engine.item_exists(&key).await?;
            println!("{exists}");
            if !exists {
                std::process::exit(1);
            }
        }
        Command::Clear => {
            engine.clear().await?;
            tracing::info!(path = engine.config().storage_path(), "storage cleared");
        }
        Command::Dump => {
            engine.log_stored_items().await?;
        }
    }

    Ok(())
}
