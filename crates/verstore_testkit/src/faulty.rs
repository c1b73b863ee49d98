//! Fault injection around a remote entry store.
//!
//! [`FaultyStore`] forwards to an inner store and can fail calls, go
//! offline, or let a rival writer land between an updater's read and its
//! conditional write.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use tracing::debug;
use verstore_remote::{
    Cursor, Entry, EntryId, EntryWrite, ListFilter, ListPage, RemoteEntryStore, RemoteError,
    RemoteResult, StoreCoordinate, StoreKind,
};

/// Per-operation call counters.
#[derive(Debug, Default)]
pub struct CallCounts {
    fetch: AtomicU64,
    upsert: AtomicU64,
    delete: AtomicU64,
    list: AtomicU64,
}

impl CallCounts {
    /// Fetch calls seen, including failed ones.
    pub fn fetches(&self) -> u64 {
        self.fetch.load(Ordering::Relaxed)
    }

    /// Upsert calls seen, including failed ones.
    pub fn upserts(&self) -> u64 {
        self.upsert.load(Ordering::Relaxed)
    }

    /// Delete calls seen, including failed ones.
    pub fn deletes(&self) -> u64 {
        self.delete.load(Ordering::Relaxed)
    }

    /// Entry and store-name list calls seen, including failed ones.
    pub fn lists(&self) -> u64 {
        self.list.load(Ordering::Relaxed)
    }
}

/// A remote store wrapper with controllable failures.
pub struct FaultyStore<S> {
    inner: S,
    fail_next: AtomicU32,
    offline: AtomicBool,
    rival_writes: Mutex<VecDeque<Value>>,
    counts: CallCounts,
}

impl<S: RemoteEntryStore> FaultyStore<S> {
    /// Wraps `inner` with no faults armed.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fail_next: AtomicU32::new(0),
            offline: AtomicBool::new(false),
            rival_writes: Mutex::new(VecDeque::new()),
            counts: CallCounts::default(),
        }
    }

    /// Returns the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Returns the call counters.
    pub fn counts(&self) -> &CallCounts {
        &self.counts
    }

    /// Fails the next `n` calls of any kind with `Unavailable`.
    pub fn fail_next(&self, n: u32) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    /// Fails every call while offline.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Queues rival writes.
    ///
    /// Each queued value is written unconditionally to the target entry
    /// just before the next conditional upsert reaches the inner store, so
    /// that upsert conflicts.
    pub fn race_next_updates(&self, values: impl IntoIterator<Item = Value>) {
        self.rival_writes.lock().extend(values);
    }

    /// Number of rival writes still queued.
    pub fn pending_races(&self) -> usize {
        self.rival_writes.lock().len()
    }

    fn check(&self, operation: &str) -> RemoteResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RemoteError::unavailable(format!("{operation}: store offline")));
        }
        let armed = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if armed.is_ok() {
            return Err(RemoteError::unavailable(format!("{operation}: injected failure")));
        }
        Ok(())
    }
}

#[async_trait]
impl<S: RemoteEntryStore> RemoteEntryStore for FaultyStore<S> {
    async fn fetch_entry(&self, id: &EntryId) -> RemoteResult<Option<Entry>> {
        self.counts.fetch.fetch_add(1, Ordering::Relaxed);
        self.check("fetch")?;
        self.inner.fetch_entry(id).await
    }

    async fn upsert_entry(
        &self,
        id: &EntryId,
        write: EntryWrite,
        expected_version: Option<u64>,
    ) -> RemoteResult<Entry> {
        self.counts.upsert.fetch_add(1, Ordering::Relaxed);
        self.check("upsert")?;

        if expected_version.is_some() {
            let rival = self.rival_writes.lock().pop_front();
            if let Some(value) = rival {
                let rival_write = match (id.kind(), value.as_f64()) {
                    (StoreKind::Ordered, Some(sort_value)) => EntryWrite::ordered(value, sort_value),
                    _ => EntryWrite::standard(value),
                };
                let landed = self.inner.upsert_entry(id, rival_write, None).await?;
                debug!(entry = %id, version = landed.version, "rival write landed");
            }
        }

        self.inner.upsert_entry(id, write, expected_version).await
    }

    async fn delete_entry(&self, id: &EntryId) -> RemoteResult<Option<Entry>> {
        self.counts.delete.fetch_add(1, Ordering::Relaxed);
        self.check("delete")?;
        self.inner.delete_entry(id).await
    }

    async fn list_entries(
        &self,
        coordinate: &StoreCoordinate,
        filter: &ListFilter,
        cursor: Option<&Cursor>,
        page_size: u32,
    ) -> RemoteResult<ListPage<Entry>> {
        self.counts.list.fetch_add(1, Ordering::Relaxed);
        self.check("list")?;
        self.inner
            .list_entries(coordinate, filter, cursor, page_size)
            .await
    }

    async fn list_store_names(
        &self,
        prefix: Option<&str>,
        cursor: Option<&Cursor>,
        page_size: u32,
    ) -> RemoteResult<ListPage<String>> {
        self.counts.list.fetch_add(1, Ordering::Relaxed);
        self.check("list")?;
        self.inner.list_store_names(prefix, cursor, page_size).await
    }
}
