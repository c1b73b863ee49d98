//! verstore CLI
//!
//! Command-line access to a file-backed verstore.
//!
//! # Commands
//!
//! - `get`, `set`, `increment`, `remove` - Single-entry operations
//! - `keys` - List keys of a store
//! - `sorted` - List an ordered store by value
//! - `stores` - List store names
//! - `watch` - Print changes to a key until interrupted

mod commands;

use clap::{Parser, Subcommand};
use commands::{Format, StoreArgs};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use verstore_core::{ClientConfig, DataStoreClient};
use verstore_remote::FileEntryStore;

/// verstore command-line tools.
#[derive(Parser)]
#[command(name = "verstore")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store file
    #[arg(global = true, short, long, default_value = "verstore.json")]
    path: PathBuf,

    /// Store name (defaults to the global store)
    #[arg(global = true, short, long)]
    store: Option<String>,

    /// Scope within the store
    #[arg(global = true, long)]
    scope: Option<String>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a key
    Get {
        /// Key to read
        key: String,

        /// Read from the ordered store
        #[arg(short, long)]
        ordered: bool,

        /// Fail if the key is missing
        #[arg(long)]
        strict: bool,
    },

    /// Write a key (value parsed as JSON, else taken as a string)
    Set {
        /// Key to write
        key: String,

        /// Value to write
        value: String,

        /// Write to the ordered store
        #[arg(short, long)]
        ordered: bool,
    },

    /// Atomically add to a numeric key
    Increment {
        /// Key to increment
        key: String,

        /// Amount to add
        #[arg(default_value = "1", allow_hyphen_values = true)]
        delta: String,

        /// Increment in the ordered store
        #[arg(short, long)]
        ordered: bool,
    },

    /// Delete a key
    Remove {
        /// Key to delete
        key: String,

        /// Delete from the ordered store
        #[arg(short, long)]
        ordered: bool,
    },

    /// List keys
    Keys {
        /// Only keys starting with this prefix
        #[arg(long)]
        prefix: Option<String>,

        /// Keys fetched per page
        #[arg(long)]
        page_size: Option<u32>,

        /// Stop after this many keys
        #[arg(short, long)]
        limit: Option<usize>,

        /// Resume after a cursor printed by an earlier listing
        #[arg(long)]
        cursor: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// List an ordered store by value
    Sorted {
        /// Largest values first
        #[arg(short, long)]
        descending: bool,

        /// Inclusive lower bound
        #[arg(long, allow_hyphen_values = true)]
        min: Option<f64>,

        /// Inclusive upper bound
        #[arg(long, allow_hyphen_values = true)]
        max: Option<f64>,

        /// Entries fetched per page
        #[arg(long)]
        page_size: Option<u32>,

        /// Stop after this many entries
        #[arg(short, long)]
        limit: Option<usize>,

        /// Resume after a cursor printed by an earlier listing
        #[arg(long)]
        cursor: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// List store names
    Stores {
        /// Only names starting with this prefix
        #[arg(long)]
        prefix: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Print changes to a key until Ctrl-C
    Watch {
        /// Key to watch
        key: String,

        /// Poll interval in milliseconds
        #[arg(short, long, default_value = "1000")]
        interval_ms: u64,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Commands::Version = cli.command {
        println!("verstore CLI v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let mut config = ClientConfig::default();
    if let Commands::Watch { interval_ms, .. } = &cli.command {
        config = config.with_poll_interval(Duration::from_millis(*interval_ms));
    }
    let remote = FileEntryStore::open_with_create_dirs(&cli.path)?;
    let client = DataStoreClient::new(config, Arc::new(remote));
    let target = StoreArgs {
        store: cli.store,
        scope: cli.scope,
    };

    let output = match cli.command {
        Commands::Get {
            key,
            ordered,
            strict,
        } => commands::entries::get(&client, &target, &key, ordered, strict).await?,
        Commands::Set {
            key,
            value,
            ordered,
        } => commands::entries::set(&client, &target, &key, &value, ordered).await?,
        Commands::Increment {
            key,
            delta,
            ordered,
        } => commands::entries::increment(&client, &target, &key, &delta, ordered).await?,
        Commands::Remove { key, ordered } => {
            commands::entries::remove(&client, &target, &key, ordered).await?
        }
        Commands::Keys {
            prefix,
            page_size,
            limit,
            cursor,
            format,
        } => {
            commands::listing::keys(
                &client,
                &target,
                prefix.as_deref(),
                page_size,
                limit,
                cursor.as_deref(),
                format,
            )
            .await?
        }
        Commands::Sorted {
            descending,
            min,
            max,
            page_size,
            limit,
            cursor,
            format,
        } => {
            commands::listing::sorted(
                &client,
                &target,
                descending,
                min,
                max,
                page_size,
                limit,
                cursor.as_deref(),
                format,
            )
            .await?
        }
        Commands::Stores { prefix, format } => {
            commands::listing::stores(&client, prefix.as_deref(), format).await?
        }
        Commands::Watch { key, .. } => {
            commands::watch::run(&client, &target, &key).await?;
            return Ok(());
        }
        Commands::Version => unreachable!("handled before opening the store"),
    };

    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}
