//! Versioned read-modify-write over a single store coordinate.

use crate::config::ClientConfig;
use crate::error::{CoreError, CoreResult};
use crate::pages::{resolve_page_size, PageSource, Pages};
use crate::subscription::{Subscription, SubscriptionPoller};
use crate::value::{add_numbers, sort_value_of, type_name, validate_name};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Number, Value};
use std::sync::Arc;
use tracing::{debug, warn};
use verstore_remote::{
    Cursor, Entry, EntryId, EntryWrite, ListFilter, ListPage, RemoteEntryStore, StoreCoordinate,
    StoreKind,
};

/// Options accepted by `set`.
///
/// The backing entry shape has no room for them, so they are validated and
/// then dropped.
#[derive(Debug, Clone, Default)]
pub struct SetOptions {
    /// Users associated with the write.
    pub user_ids: Vec<u64>,
    /// Free-form metadata; must be a JSON object when present.
    pub metadata: Option<Value>,
}

impl SetOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the associated user ids.
    pub fn with_user_ids(mut self, user_ids: Vec<u64>) -> Self {
        self.user_ids = user_ids;
        self
    }

    /// Sets the metadata.
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    fn validate(&self) -> CoreResult<()> {
        match &self.metadata {
            Some(meta) if !meta.is_object() => Err(CoreError::invalid_argument(format!(
                "set metadata must be an object, got {}",
                type_name(meta)
            ))),
            _ => Ok(()),
        }
    }
}

/// Operations shared by standard and ordered stores.
#[derive(Clone)]
pub(crate) struct StoreCore {
    coordinate: StoreCoordinate,
    remote: Arc<dyn RemoteEntryStore>,
    config: Arc<ClientConfig>,
}

impl StoreCore {
    pub(crate) fn new(
        coordinate: StoreCoordinate,
        remote: Arc<dyn RemoteEntryStore>,
        config: Arc<ClientConfig>,
    ) -> Self {
        Self {
            coordinate,
            remote,
            config,
        }
    }

    pub(crate) fn coordinate(&self) -> &StoreCoordinate {
        &self.coordinate
    }

    pub(crate) fn remote(&self) -> &Arc<dyn RemoteEntryStore> {
        &self.remote
    }

    pub(crate) fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn entry_id(&self, key: &str) -> CoreResult<EntryId> {
        validate_name("key", key)?;
        Ok(self.coordinate.entry_id(key))
    }

    /// Shapes a value for this store's kind; ordered stores take numbers only.
    fn encode(&self, key: &str, value: Value) -> CoreResult<EntryWrite> {
        match self.coordinate.kind {
            StoreKind::Standard => Ok(EntryWrite::standard(value)),
            StoreKind::Ordered => match sort_value_of(&value) {
                Some(sort_value) => Ok(EntryWrite::ordered(value, sort_value)),
                None => Err(CoreError::invalid_value(
                    key,
                    format!("ordered stores only accept numbers, got {}", type_name(&value)),
                )),
            },
        }
    }

    pub(crate) async fn get_entry(&self, key: &str) -> CoreResult<Option<Entry>> {
        let id = self.entry_id(key)?;
        Ok(self.remote.fetch_entry(&id).await?)
    }

    pub(crate) async fn get(&self, key: &str) -> CoreResult<Option<Value>> {
        Ok(self.get_entry(key).await?.map(|entry| entry.value))
    }

    pub(crate) async fn set(
        &self,
        key: &str,
        value: Value,
        options: Option<&SetOptions>,
    ) -> CoreResult<Option<Value>> {
        let id = self.entry_id(key)?;
        if let Some(options) = options {
            options.validate()?;
            debug!(
                entry = %id,
                user_ids = options.user_ids.len(),
                "set options are not persisted"
            );
        }
        let write = self.encode(key, value)?;

        let previous = self.remote.fetch_entry(&id).await?;
        let stored = self.remote.upsert_entry(&id, write, None).await?;
        debug!(entry = %id, version = stored.version, "set");

        Ok(previous.map(|entry| entry.value))
    }

    /// Compare-and-swap loop behind every atomic operation.
    ///
    /// `transform` sees the current value (`None` when absent) and returns
    /// the value to write, `None` to abort without writing, or an error to
    /// abort the whole call. It may run once per attempt.
    pub(crate) async fn update_with<F>(&self, key: &str, mut transform: F) -> CoreResult<Option<Value>>
    where
        F: FnMut(Option<&Value>) -> CoreResult<Option<Value>> + Send,
    {
        let id = self.entry_id(key)?;
        let attempts = self.config.max_update_attempts();

        for attempt in 0..attempts {
            let delay = self.config.backoff.delay_for_attempt(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let current = self.remote.fetch_entry(&id).await?;
            let (value, version) = match &current {
                Some(entry) => (Some(&entry.value), entry.version),
                None => (None, 0),
            };

            let Some(next) = transform(value)? else {
                debug!(entry = %id, version, "update aborted by transform");
                return Ok(None);
            };
            let write = self.encode(key, next)?;

            match self.remote.upsert_entry(&id, write, Some(version)).await {
                Ok(stored) => {
                    debug!(entry = %id, version = stored.version, attempt, "update committed");
                    return Ok(Some(stored.value));
                }
                Err(err) if err.is_conflict() => {
                    debug!(entry = %id, attempt, error = %err, "update conflicted, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }

        warn!(entry = %id, attempts, "update retries exhausted");
        Err(CoreError::ConcurrencyExhausted {
            key: key.to_string(),
            attempts,
        })
    }

    pub(crate) async fn increment(&self, key: &str, delta: Number) -> CoreResult<Number> {
        let updated = self
            .update_with(key, |current| {
                let base = match current {
                    None | Some(Value::Null) => Number::from(0),
                    Some(Value::Number(n)) => n.clone(),
                    Some(other) => {
                        return Err(CoreError::invalid_value(
                            key,
                            format!("cannot increment a {}", type_name(other)),
                        ))
                    }
                };
                add_numbers(&base, &delta)
                    .map(|sum| Some(Value::Number(sum)))
                    .ok_or_else(|| {
                        CoreError::invalid_value(key, format!("{base} + {delta} is out of range"))
                    })
            })
            .await?;

        match updated {
            Some(Value::Number(n)) => Ok(n),
            _ => Err(CoreError::invalid_state("increment committed a non-numeric value")),
        }
    }

    pub(crate) async fn remove(&self, key: &str) -> CoreResult<Option<Value>> {
        let id = self.entry_id(key)?;
        let removed = self.remote.delete_entry(&id).await?;
        debug!(entry = %id, existed = removed.is_some(), "remove");
        Ok(removed.map(|entry| entry.value))
    }
}

/// Lists the keys of one coordinate by prefix.
struct KeySource {
    remote: Arc<dyn RemoteEntryStore>,
    coordinate: StoreCoordinate,
    filter: ListFilter,
}

#[async_trait]
impl PageSource<String> for KeySource {
    async fn fetch_page(
        &self,
        cursor: Option<&Cursor>,
        page_size: u32,
    ) -> CoreResult<ListPage<String>> {
        let page = self
            .remote
            .list_entries(&self.coordinate, &self.filter, cursor, page_size)
            .await?;
        Ok(ListPage::new(
            page.items.into_iter().map(|entry| entry.id.key).collect(),
            page.next_cursor,
        ))
    }
}

/// A handle to one standard data store.
///
/// Handles are cheap to clone and hold no cached state: every read is a
/// fresh fetch from the remote store.
#[derive(Clone)]
pub struct DataStore {
    core: StoreCore,
    poller: Arc<SubscriptionPoller>,
}

impl DataStore {
    pub(crate) fn new(core: StoreCore, poller: Arc<SubscriptionPoller>) -> Self {
        Self { core, poller }
    }

    /// Returns the store name.
    pub fn name(&self) -> &str {
        &self.core.coordinate().store_name
    }

    /// Returns the scope.
    pub fn scope(&self) -> &str {
        &self.core.coordinate().scope
    }

    /// Returns the coordinate this handle is bound to.
    pub fn coordinate(&self) -> &StoreCoordinate {
        self.core.coordinate()
    }

    /// Reads the value stored under `key`.
    pub async fn get(&self, key: &str) -> CoreResult<Option<Value>> {
        self.core.get(key).await
    }

    /// Overwrites `key` unconditionally and returns the previous value.
    ///
    /// Concurrent writers are not detected; the last write wins. Use
    /// [`DataStore::update`] for read-modify-write.
    ///
    /// The previous value is read just before the write, not as part of it.
    /// If another writer lands in between, the returned value is the one
    /// read, which may not be the value this call replaced.
    pub async fn set(
        &self,
        key: &str,
        value: Value,
        options: Option<&SetOptions>,
    ) -> CoreResult<Option<Value>> {
        self.core.set(key, value, options).await
    }

    /// Atomically replaces the value of `key` with `transform(current)`.
    ///
    /// Returning `None` from `transform` aborts the update without writing,
    /// and the call returns `None`. On a version conflict the transform is
    /// re-run against the fresh value, up to `update_retries` times.
    ///
    /// # Errors
    ///
    /// [`CoreError::ConcurrencyExhausted`] when every attempt conflicted.
    pub async fn update<F>(&self, key: &str, mut transform: F) -> CoreResult<Option<Value>>
    where
        F: FnMut(Option<&Value>) -> Option<Value> + Send,
    {
        self.core
            .update_with(key, |current| Ok(transform(current)))
            .await
    }

    /// Atomically adds `delta` to the number under `key`, treating absence
    /// as zero, and returns the new number.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidValueType`] if the stored value is not a number.
    pub async fn increment(&self, key: &str, delta: impl Into<Number>) -> CoreResult<Number> {
        self.core.increment(key, delta.into()).await
    }

    /// Deletes `key` and returns the value it held.
    ///
    /// The delete is unconditional. To delete only an unchanged value, use
    /// [`DataStore::update`] and inspect the value first.
    pub async fn remove(&self, key: &str) -> CoreResult<Option<Value>> {
        self.core.remove(key).await
    }

    /// Lists keys in ascending order, optionally filtered by prefix.
    ///
    /// The returned [`Pages`] is lazy; call
    /// [`Pages::advance_to_next_page`] to load the first page.
    pub fn list_keys(
        &self,
        prefix: Option<&str>,
        page_size: Option<u32>,
        cursor: Option<Cursor>,
    ) -> CoreResult<Pages<String>> {
        let page_size = resolve_page_size(page_size, self.core.config().default_page_size)?;
        let prefix = prefix.filter(|p| !p.is_empty()).map(str::to_string);
        let source = KeySource {
            remote: Arc::clone(self.core.remote()),
            coordinate: self.core.coordinate().clone(),
            filter: ListFilter::Prefix(prefix),
        };
        Ok(Pages::new(source, page_size, cursor))
    }

    /// Calls `callback` with the new value whenever `key` changes.
    ///
    /// Changes are detected by polling every `on_update_poll_interval`, so a
    /// notification arrives up to one interval after the write. Deletion is
    /// reported once as `None`. The callback runs on the poller task.
    pub async fn on_update<F>(&self, key: &str, callback: F) -> CoreResult<Subscription>
    where
        F: Fn(Option<Value>) + Send + Sync + 'static,
    {
        let id = self.core.entry_id(key)?;
        self.poller.subscribe(id, Arc::new(callback)).await
    }

    /// Version history is not retained; always fails.
    pub async fn get_version(&self, _key: &str, _version: &str) -> CoreResult<Option<Value>> {
        Err(CoreError::NotImplemented {
            operation: "GetVersionAsync",
        })
    }

    /// Version history is not retained; always fails.
    pub async fn get_version_at_time(
        &self,
        _key: &str,
        _timestamp: DateTime<Utc>,
    ) -> CoreResult<Option<Value>> {
        Err(CoreError::NotImplemented {
            operation: "GetVersionAtTimeAsync",
        })
    }

    /// Version history is not retained; always fails.
    pub async fn get_versions(
        &self,
        _key: &str,
        _ascending: bool,
        _page_size: Option<u32>,
    ) -> CoreResult<Pages<String>> {
        Err(CoreError::NotImplemented {
            operation: "GetVersionsAsync",
        })
    }

    /// Version history is not retained; always fails.
    pub async fn remove_version(&self, _key: &str, _version: &str) -> CoreResult<()> {
        Err(CoreError::NotImplemented {
            operation: "RemoveVersionAsync",
        })
    }
}

impl std::fmt::Debug for DataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataStore")
            .field("coordinate", self.core.coordinate())
            .finish()
    }
}
