//! The client: store handle factory and shared poller.

use crate::config::ClientConfig;
use crate::datastore::{DataStore, StoreCore};
use crate::error::CoreResult;
use crate::ordered::OrderedDataStore;
use crate::pages::{resolve_page_size, PageSource, Pages};
use crate::subscription::SubscriptionPoller;
use crate::value::validate_name;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use verstore_remote::{
    Cursor, ListPage, RemoteEntryStore, StoreCoordinate, StoreKind, DEFAULT_SCOPE,
};

/// Request categories that upstream rate limits are tracked by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestType {
    /// Reads.
    GetAsync,
    /// Sets and increments on standard stores.
    SetIncrementAsync,
    /// Atomic updates.
    UpdateAsync,
    /// Sorted listings.
    GetSortedAsync,
    /// Sets and increments on ordered stores.
    SetIncrementSortedAsync,
    /// Subscriptions.
    OnUpdate,
    /// Key and store listings.
    ListAsync,
    /// Version reads.
    GetVersionAsync,
    /// Version removal.
    RemoveVersionAsync,
}

impl RequestType {
    /// All request types.
    pub const ALL: [RequestType; 9] = [
        RequestType::GetAsync,
        RequestType::SetIncrementAsync,
        RequestType::UpdateAsync,
        RequestType::GetSortedAsync,
        RequestType::SetIncrementSortedAsync,
        RequestType::OnUpdate,
        RequestType::ListAsync,
        RequestType::GetVersionAsync,
        RequestType::RemoveVersionAsync,
    ];
}

struct StoreNameSource {
    remote: Arc<dyn RemoteEntryStore>,
    prefix: Option<String>,
}

#[async_trait]
impl PageSource<String> for StoreNameSource {
    async fn fetch_page(
        &self,
        cursor: Option<&Cursor>,
        page_size: u32,
    ) -> CoreResult<ListPage<String>> {
        Ok(self
            .remote
            .list_store_names(self.prefix.as_deref(), cursor, page_size)
            .await?)
    }
}

/// Entry point for all datastore operations.
///
/// A client owns its configuration, the remote store it talks to, and the
/// poller behind every `on_update` subscription made through its handles.
/// Handles stay valid after the client is dropped; the poller stops once
/// the client and every standard store handle are gone.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use serde_json::json;
/// use verstore_core::{ClientConfig, DataStoreClient};
/// use verstore_remote::InMemoryEntryStore;
///
/// # async fn run() -> verstore_core::CoreResult<()> {
/// let client = DataStoreClient::new(ClientConfig::default(), Arc::new(InMemoryEntryStore::new()));
/// let players = client.get_data_store("players", None)?;
///
/// players.set("alice", json!({"coins": 10}), None).await?;
/// let coins = players.increment("alice_coins", 5).await?;
/// assert_eq!(coins.as_i64(), Some(5));
/// # Ok(())
/// # }
/// ```
pub struct DataStoreClient {
    config: Arc<ClientConfig>,
    remote: Arc<dyn RemoteEntryStore>,
    poller: Arc<SubscriptionPoller>,
}

impl DataStoreClient {
    /// Creates a client over `remote`.
    pub fn new(config: ClientConfig, remote: Arc<dyn RemoteEntryStore>) -> Self {
        debug!(
            table = %config.table_name,
            poll_interval_ms = config.on_update_poll_interval.as_millis() as u64,
            update_retries = config.update_retries,
            "creating datastore client"
        );
        let poller = Arc::new(SubscriptionPoller::new(
            Arc::clone(&remote),
            config.on_update_poll_interval,
        ));
        Self {
            config: Arc::new(config),
            remote,
            poller,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn core(&self, name: &str, scope: Option<&str>, kind: StoreKind) -> CoreResult<StoreCore> {
        validate_name("store name", name)?;
        let scope = scope.unwrap_or(DEFAULT_SCOPE);
        validate_name("scope", scope)?;

        Ok(StoreCore::new(
            StoreCoordinate::new(name, scope, kind),
            Arc::clone(&self.remote),
            Arc::clone(&self.config),
        ))
    }

    /// Returns a handle to the standard store `name` in `scope`
    /// (default `"global"`).
    ///
    /// No remote call is made; stores exist once they hold an entry.
    pub fn get_data_store(&self, name: &str, scope: Option<&str>) -> CoreResult<DataStore> {
        let core = self.core(name, scope, StoreKind::Standard)?;
        Ok(DataStore::new(core, Arc::clone(&self.poller)))
    }

    /// Returns the standard store named by `global_data_store_name`.
    pub fn get_global_data_store(&self) -> CoreResult<DataStore> {
        self.get_data_store(&self.config.global_data_store_name, None)
    }

    /// Returns a handle to the ordered store `name` in `scope`.
    ///
    /// Ordered and standard stores with the same name and scope are
    /// separate namespaces.
    pub fn get_ordered_data_store(
        &self,
        name: &str,
        scope: Option<&str>,
    ) -> CoreResult<OrderedDataStore> {
        let core = self.core(name, scope, StoreKind::Ordered)?;
        Ok(OrderedDataStore::new(core))
    }

    /// Lists the names of stores holding at least one entry, in ascending
    /// order, each name once regardless of scope or kind.
    pub fn list_data_stores(
        &self,
        prefix: Option<&str>,
        page_size: Option<u32>,
        cursor: Option<Cursor>,
    ) -> CoreResult<Pages<String>> {
        let page_size = resolve_page_size(page_size, self.config.default_page_size)?;
        let source = StoreNameSource {
            remote: Arc::clone(&self.remote),
            prefix: prefix.filter(|p| !p.is_empty()).map(str::to_string),
        };
        Ok(Pages::new(source, page_size, cursor))
    }

    /// Remaining request budget for a request type.
    ///
    /// No rate limits are enforced, so this is always infinite.
    pub fn get_request_budget_for_request_type(&self, _request_type: RequestType) -> f64 {
        f64::INFINITY
    }

    /// Number of connected `on_update` subscriptions.
    pub fn active_subscriptions(&self) -> usize {
        self.poller.active_count()
    }
}

impl std::fmt::Debug for DataStoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataStoreClient")
            .field("config", &self.config)
            .field("active_subscriptions", &self.active_subscriptions())
            .finish()
    }
}
