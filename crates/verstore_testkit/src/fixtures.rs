//! Test fixtures and client helpers.
//!
//! Provides convenience functions for setting up test clients over the
//! reference stores and seeding common scenarios.

use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use verstore_core::{BackoffConfig, ClientConfig, DataStore, DataStoreClient, OrderedDataStore};
use verstore_remote::{FileEntryStore, InMemoryEntryStore, RemoteEntryStore};

/// Poll interval used by [`fast_config`].
pub const FAST_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A configuration suited to tests: no retry backoff and a short poll
/// interval.
pub fn fast_config() -> ClientConfig {
    ClientConfig::new()
        .with_poll_interval(FAST_POLL_INTERVAL)
        .with_backoff(BackoffConfig::none())
}

/// A test client with automatic cleanup of any backing files.
pub struct TestClient {
    /// The client instance.
    pub client: DataStoreClient,
    /// The remote store behind the client.
    pub remote: Arc<dyn RemoteEntryStore>,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: Option<TempDir>,
}

impl TestClient {
    /// Creates a client over a fresh in-memory store.
    pub fn memory() -> Self {
        Self::memory_with(fast_config())
    }

    /// Creates a client over a fresh in-memory store with `config`.
    pub fn memory_with(config: ClientConfig) -> Self {
        Self::over(Arc::new(InMemoryEntryStore::new()), config)
    }

    /// Creates a client over a file store in a temporary directory.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("data").join("entries.json");
        let remote =
            FileEntryStore::open_with_create_dirs(&path).expect("Failed to open file store");

        let mut fixture = Self::over(Arc::new(remote), fast_config());
        fixture._temp_dir = Some(temp_dir);
        fixture
    }

    /// Creates a client over an existing remote store.
    pub fn over(remote: Arc<dyn RemoteEntryStore>, config: ClientConfig) -> Self {
        Self {
            client: DataStoreClient::new(config, Arc::clone(&remote)),
            remote,
            _temp_dir: None,
        }
    }

    /// Returns the backing file path if file-based, None if in-memory.
    pub fn path(&self) -> Option<PathBuf> {
        self._temp_dir
            .as_ref()
            .map(|d| d.path().join("data").join("entries.json"))
    }

    /// Returns a standard store handle, panicking on invalid names.
    pub fn store(&self, name: &str) -> DataStore {
        self.client
            .get_data_store(name, None)
            .expect("Failed to open data store")
    }

    /// Returns an ordered store handle, panicking on invalid names.
    pub fn ordered(&self, name: &str) -> OrderedDataStore {
        self.client
            .get_ordered_data_store(name, None)
            .expect("Failed to open ordered data store")
    }
}

impl std::ops::Deref for TestClient {
    type Target = DataStoreClient;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}

/// Writes each `(key, value)` pair with `set`.
pub async fn seed(store: &DataStore, rows: &[(&str, Value)]) {
    for (key, value) in rows {
        store
            .set(key, value.clone(), None)
            .await
            .expect("Failed to seed entry");
    }
}

/// Writes `key_0 .. key_{count-1}` with their index as value.
pub async fn seed_numbered(store: &DataStore, prefix: &str, count: usize) -> Vec<String> {
    let mut keys = Vec::with_capacity(count);
    for i in 0..count {
        let key = format!("{prefix}{i:04}");
        store
            .set(&key, Value::from(i), None)
            .await
            .expect("Failed to seed entry");
        keys.push(key);
    }
    keys
}

/// Writes each `(key, score)` pair into an ordered store.
pub async fn seed_scores(store: &OrderedDataStore, rows: &[(&str, i64)]) {
    for (key, score) in rows {
        store
            .set(key, *score, None)
            .await
            .expect("Failed to seed score");
    }
}
