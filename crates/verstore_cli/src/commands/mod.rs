//! CLI command implementations.

pub mod entries;
pub mod listing;
pub mod watch;

use serde_json::Value;
use verstore_core::{CoreResult, DataStore, DataStoreClient, OrderedDataStore};

/// Store selection shared by the entry commands.
#[derive(Debug, Clone, Default)]
pub struct StoreArgs {
    /// Store name; the global store when absent.
    pub store: Option<String>,
    /// Scope; `global` when absent.
    pub scope: Option<String>,
}

impl StoreArgs {
    fn name<'a>(&'a self, client: &'a DataStoreClient) -> &'a str {
        self.store
            .as_deref()
            .unwrap_or(&client.config().global_data_store_name)
    }

    /// Opens the selected standard store.
    pub fn standard(&self, client: &DataStoreClient) -> CoreResult<DataStore> {
        client.get_data_store(self.name(client), self.scope.as_deref())
    }

    /// Opens the selected ordered store.
    pub fn ordered(&self, client: &DataStoreClient) -> CoreResult<OrderedDataStore> {
        client.get_ordered_data_store(self.name(client), self.scope.as_deref())
    }
}

/// Output format for listing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// One row per line.
    Text,
    /// A single JSON document.
    Json,
}

/// Parses a command-line value as JSON, falling back to a plain string.
pub fn parse_value(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Renders a value for terminal output.
pub fn render(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "(nil)".to_string(),
    }
}
