//! In-memory entry store.

use crate::entry::{Entry, EntryId, EntryWrite, StoreCoordinate};
use crate::error::RemoteResult;
use crate::store::{Cursor, ListFilter, ListPage, RemoteEntryStore};
use crate::table::EntryTable;
use async_trait::async_trait;
use parking_lot::RwLock;

/// An in-memory entry store.
///
/// This store keeps all entries in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral stores that don't need persistence
///
/// # Thread Safety
///
/// The store is thread-safe and can be shared across tasks. Each operation
/// holds the table lock for its whole duration, so conditional upserts are
/// atomic with respect to each other.
///
/// # Example
///
/// ```rust
/// use verstore_remote::{EntryId, EntryWrite, InMemoryEntryStore, RemoteEntryStore, StoreKind};
///
/// # tokio_test_block_on(async {
/// let store = InMemoryEntryStore::new();
/// let id = EntryId::new("players", "global", StoreKind::Standard, "alice");
/// let entry = store
///     .upsert_entry(&id, EntryWrite::standard(serde_json::json!(10)), Some(0))
///     .await
///     .unwrap();
/// assert_eq!(entry.version, 1);
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Debug, Default)]
pub struct InMemoryEntryStore {
    table: RwLock<EntryTable>,
}

impl InMemoryEntryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with entries.
    ///
    /// Useful for seeding listing scenarios.
    #[must_use]
    pub fn with_entries(entries: Vec<Entry>) -> Self {
        Self {
            table: RwLock::new(EntryTable::from_entries(entries)),
        }
    }

    /// Returns a copy of every stored entry, in identity order.
    #[must_use]
    pub fn entries(&self) -> Vec<Entry> {
        self.table.read().to_entries()
    }

    /// Returns the number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    /// Returns true if no entry is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes all entries.
    pub fn clear(&self) {
        *self.table.write() = EntryTable::new();
    }
}

#[async_trait]
impl RemoteEntryStore for InMemoryEntryStore {
    async fn fetch_entry(&self, id: &EntryId) -> RemoteResult<Option<Entry>> {
        Ok(self.table.read().get(id))
    }

    async fn upsert_entry(
        &self,
        id: &EntryId,
        write: EntryWrite,
        expected_version: Option<u64>,
    ) -> RemoteResult<Entry> {
        self.table.write().upsert(id, write, expected_version)
    }

    async fn delete_entry(&self, id: &EntryId) -> RemoteResult<Option<Entry>> {
        Ok(self.table.write().delete(id))
    }

    async fn list_entries(
        &self,
        coordinate: &StoreCoordinate,
        filter: &ListFilter,
        cursor: Option<&Cursor>,
        page_size: u32,
    ) -> RemoteResult<ListPage<Entry>> {
        self.table.read().list(coordinate, filter, cursor, page_size)
    }

    async fn list_store_names(
        &self,
        prefix: Option<&str>,
        cursor: Option<&Cursor>,
        page_size: u32,
    ) -> RemoteResult<ListPage<String>> {
        self.table.read().store_names(prefix, cursor, page_size)
    }
}
