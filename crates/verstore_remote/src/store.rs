//! Remote entry store trait definition.

use crate::entry::{Entry, EntryId, EntryWrite, StoreCoordinate};
use crate::error::RemoteResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque continuation token for a paged listing.
///
/// Tokens are produced by a store and only ever handed back to the same
/// store. Callers must not construct or inspect them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Wraps a raw token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Filter and ordering for [`RemoteEntryStore::list_entries`].
#[derive(Debug, Clone, PartialEq)]
pub enum ListFilter {
    /// Entries whose key starts with the prefix, ordered by key ascending.
    Prefix(Option<String>),
    /// Entries whose sort value lies in `[min, max]` (each bound optional),
    /// ordered by sort value then key ascending.
    Range {
        /// Inclusive lower bound.
        min: Option<f64>,
        /// Inclusive upper bound.
        max: Option<f64>,
        /// Sort value direction. Ties always order by key ascending.
        ascending: bool,
    },
}

impl ListFilter {
    /// Filter matching every key.
    pub fn all_keys() -> Self {
        ListFilter::Prefix(None)
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage<T> {
    /// Items in listing order.
    pub items: Vec<T>,
    /// Cursor for the next page, `None` once the listing is exhausted.
    pub next_cursor: Option<Cursor>,
}

impl<T> ListPage<T> {
    /// Creates a page.
    pub fn new(items: Vec<T>, next_cursor: Option<Cursor>) -> Self {
        Self { items, next_cursor }
    }

    /// Returns true if no further page exists.
    pub fn is_last(&self) -> bool {
        self.next_cursor.is_none()
    }
}

/// A remote store of versioned entries.
///
/// Stores offer primitive single-entry operations only. There is no locking
/// and no multi-entry transaction; the single concurrency primitive is the
/// conditional upsert.
///
/// # Invariants
///
/// - At most one entry exists per [`EntryId`]
/// - Every successful upsert stores `version = previous + 1`, where an absent
///   entry counts as version 0
/// - An upsert with `expected_version` fails with
///   [`crate::RemoteError::VersionConflict`] when the stored version differs
/// - Deleting an entry resets its version history
///
/// # Implementors
///
/// - [`crate::InMemoryEntryStore`] - For tests and ephemeral use
/// - [`crate::FileEntryStore`] - JSON file persisted store
#[async_trait]
pub trait RemoteEntryStore: Send + Sync {
    /// Fetches the entry, or `None` if absent.
    async fn fetch_entry(&self, id: &EntryId) -> RemoteResult<Option<Entry>>;

    /// Writes an entry, optionally conditioned on the stored version.
    ///
    /// Returns the entry as stored.
    async fn upsert_entry(
        &self,
        id: &EntryId,
        write: EntryWrite,
        expected_version: Option<u64>,
    ) -> RemoteResult<Entry>;

    /// Deletes the entry and returns what was stored before deletion.
    async fn delete_entry(&self, id: &EntryId) -> RemoteResult<Option<Entry>>;

    /// Lists entries of one coordinate.
    async fn list_entries(
        &self,
        coordinate: &StoreCoordinate,
        filter: &ListFilter,
        cursor: Option<&Cursor>,
        page_size: u32,
    ) -> RemoteResult<ListPage<Entry>>;

    /// Lists distinct store names holding at least one live entry.
    async fn list_store_names(
        &self,
        prefix: Option<&str>,
        cursor: Option<&Cursor>,
        page_size: u32,
    ) -> RemoteResult<ListPage<String>>;
}
