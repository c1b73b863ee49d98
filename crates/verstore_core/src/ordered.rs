//! Numeric stores with sorted range listing.

use crate::datastore::{SetOptions, StoreCore};
use crate::error::{CoreError, CoreResult};
use crate::pages::{resolve_page_size, PageSource, Pages};
use crate::value::type_name;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::sync::Arc;
use verstore_remote::{Cursor, ListFilter, ListPage, RemoteEntryStore, StoreCoordinate};

/// One `(key, value)` row of a sorted listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortedEntry {
    /// Entry key.
    pub key: String,
    /// Numeric value the row is sorted by.
    pub value: Number,
}

fn expect_number(key: &str, value: Value) -> CoreResult<Number> {
    match value {
        Value::Number(n) => Ok(n),
        other => Err(CoreError::invalid_value(
            key,
            format!("ordered entry holds a {}", type_name(&other)),
        )),
    }
}

fn expect_optional_number(key: &str, value: Option<Value>) -> CoreResult<Option<Number>> {
    value.map(|v| expect_number(key, v)).transpose()
}

struct SortedSource {
    remote: Arc<dyn RemoteEntryStore>,
    coordinate: StoreCoordinate,
    filter: ListFilter,
}

#[async_trait]
impl PageSource<SortedEntry> for SortedSource {
    async fn fetch_page(
        &self,
        cursor: Option<&Cursor>,
        page_size: u32,
    ) -> CoreResult<ListPage<SortedEntry>> {
        let page = self
            .remote
            .list_entries(&self.coordinate, &self.filter, cursor, page_size)
            .await?;
        let items = page
            .items
            .into_iter()
            .map(|entry| {
                let key = entry.id.key;
                let value = expect_number(&key, entry.value)?;
                Ok(SortedEntry { key, value })
            })
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(ListPage::new(items, page.next_cursor))
    }
}

/// A handle to one ordered data store.
///
/// Values are numbers only; writes of any other type fail with
/// [`CoreError::InvalidValueType`] before reaching the remote store.
#[derive(Clone)]
pub struct OrderedDataStore {
    core: StoreCore,
}

impl OrderedDataStore {
    pub(crate) fn new(core: StoreCore) -> Self {
        Self { core }
    }

    /// Returns the store name.
    pub fn name(&self) -> &str {
        &self.core.coordinate().store_name
    }

    /// Returns the scope.
    pub fn scope(&self) -> &str {
        &self.core.coordinate().scope
    }

    /// Reads the number stored under `key`.
    pub async fn get(&self, key: &str) -> CoreResult<Option<Number>> {
        let value = self.core.get(key).await?;
        expect_optional_number(key, value)
    }

    /// Overwrites `key` unconditionally and returns the previous number.
    ///
    /// As with [`DataStore::set`](crate::DataStore::set), the previous number
    /// comes from a separate read and can be stale under concurrent writes.
    pub async fn set(
        &self,
        key: &str,
        value: impl Into<Value>,
        options: Option<&SetOptions>,
    ) -> CoreResult<Option<Number>> {
        let previous = self.core.set(key, value.into(), options).await?;
        expect_optional_number(key, previous)
    }

    /// Atomically replaces the number under `key` with `transform(current)`.
    ///
    /// Same retry semantics as [`crate::DataStore::update`]. The transform
    /// must produce a number.
    pub async fn update<F>(&self, key: &str, mut transform: F) -> CoreResult<Option<Number>>
    where
        F: FnMut(Option<&Value>) -> Option<Value> + Send,
    {
        let updated = self
            .core
            .update_with(key, |current| Ok(transform(current)))
            .await?;
        expect_optional_number(key, updated)
    }

    /// Atomically adds `delta` to the number under `key`.
    pub async fn increment(&self, key: &str, delta: impl Into<Number>) -> CoreResult<Number> {
        self.core.increment(key, delta.into()).await
    }

    /// Deletes `key` and returns the number it held.
    pub async fn remove(&self, key: &str) -> CoreResult<Option<Number>> {
        let removed = self.core.remove(key).await?;
        expect_optional_number(key, removed)
    }

    /// Lists entries sorted by value, ties broken by ascending key.
    ///
    /// `min_value` and `max_value` are inclusive bounds. The returned
    /// [`Pages`] is lazy.
    pub fn get_sorted(
        &self,
        ascending: bool,
        page_size: Option<u32>,
        min_value: Option<f64>,
        max_value: Option<f64>,
    ) -> CoreResult<Pages<SortedEntry>> {
        if min_value.is_some_and(f64::is_nan) || max_value.is_some_and(f64::is_nan) {
            return Err(CoreError::invalid_argument("sorted bounds must not be NaN"));
        }
        if let (Some(min), Some(max)) = (min_value, max_value) {
            if min > max {
                return Err(CoreError::invalid_argument(format!(
                    "min value {min} is greater than max value {max}"
                )));
            }
        }
        let page_size = resolve_page_size(page_size, self.core.config().default_page_size)?;
        let source = SortedSource {
            remote: Arc::clone(self.core.remote()),
            coordinate: self.core.coordinate().clone(),
            filter: ListFilter::Range {
                min: min_value,
                max: max_value,
                ascending,
            },
        };
        Ok(Pages::new(source, page_size, None))
    }

    /// Resumes a sorted listing from a cursor taken from [`Pages::cursor`].
    ///
    /// The cursor only carries a position; the direction and bounds must
    /// match the listing it came from.
    pub fn get_sorted_from(
        &self,
        ascending: bool,
        page_size: Option<u32>,
        min_value: Option<f64>,
        max_value: Option<f64>,
        cursor: Cursor,
    ) -> CoreResult<Pages<SortedEntry>> {
        let pages = self.get_sorted(ascending, page_size, min_value, max_value)?;
        Ok(pages.with_cursor(cursor))
    }
}

impl std::fmt::Debug for OrderedDataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderedDataStore")
            .field("coordinate", self.core.coordinate())
            .finish()
    }
}
