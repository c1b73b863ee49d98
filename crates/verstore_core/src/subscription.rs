//! Polling change notification for single entries.
//!
//! One background task per client re-fetches every subscribed entry on a
//! fixed interval and fires callbacks when an entry's `(version,
//! updated_at)` pair differs from what it last saw. Polling is the only
//! change source, so a write followed by a revert within one interval may
//! go unnoticed, and a delete followed by a recreate is reported only as
//! the recreate when both land between two ticks.

use crate::error::CoreResult;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};
use verstore_remote::{Entry, EntryId, RemoteEntryStore};

/// Callback invoked with the new value, or `None` after a delete.
pub(crate) type UpdateCallback = Arc<dyn Fn(Option<Value>) + Send + Sync>;

/// Identity of an observed entry state. Absence is version 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Observed {
    version: u64,
    updated_at: Option<DateTime<Utc>>,
}

impl Observed {
    fn of(entry: Option<&Entry>) -> Self {
        match entry {
            Some(entry) => Self {
                version: entry.version,
                updated_at: Some(entry.updated_at),
            },
            None => Self {
                version: 0,
                updated_at: None,
            },
        }
    }
}

struct Watch {
    id: EntryId,
    callback: UpdateCallback,
    last_seen: Mutex<Observed>,
    active: AtomicBool,
}

impl Watch {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Records the fetched state and fires the callback if it changed.
    fn observe(&self, entry: Option<Entry>) {
        let now = Observed::of(entry.as_ref());
        {
            let mut last_seen = self.last_seen.lock();
            if *last_seen == now {
                return;
            }
            *last_seen = now;
        }

        // Re-checked so a disconnect during the fetch suppresses the call.
        if self.is_active() {
            trace!(entry = %self.id, version = now.version, "firing update callback");
            (self.callback)(entry.map(|e| e.value));
        }
    }
}

struct PollerShared {
    remote: Arc<dyn RemoteEntryStore>,
    watches: RwLock<BTreeMap<u64, Arc<Watch>>>,
    next_id: AtomicU64,
}

impl PollerShared {
    async fn poll_once(&self) {
        // Snapshot so callbacks may subscribe or disconnect freely.
        let watches: Vec<Arc<Watch>> = self.watches.read().values().cloned().collect();

        for watch in watches {
            if !watch.is_active() {
                continue;
            }
            match self.remote.fetch_entry(&watch.id).await {
                Ok(entry) => watch.observe(entry),
                Err(err) => {
                    warn!(
                        entry = %watch.id,
                        transient = err.is_transient(),
                        error = %err,
                        "subscription poll failed, retrying next tick"
                    );
                }
            }
        }
    }
}

/// Drives every subscription of one client.
///
/// The task starts with the first subscription and stops when the poller
/// is dropped.
pub(crate) struct SubscriptionPoller {
    shared: Arc<PollerShared>,
    interval: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SubscriptionPoller {
    pub(crate) fn new(remote: Arc<dyn RemoteEntryStore>, interval: Duration) -> Self {
        Self {
            shared: Arc::new(PollerShared {
                remote,
                watches: RwLock::new(BTreeMap::new()),
                next_id: AtomicU64::new(1),
            }),
            interval: interval.max(Duration::from_millis(1)),
            task: Mutex::new(None),
        }
    }

    /// Registers a callback for `id`.
    ///
    /// The current state is fetched first and becomes the baseline, so the
    /// callback only fires for changes made after this call returns.
    pub(crate) async fn subscribe(
        &self,
        id: EntryId,
        callback: UpdateCallback,
    ) -> CoreResult<Subscription> {
        let baseline = self.shared.remote.fetch_entry(&id).await?;
        let watch = Arc::new(Watch {
            id,
            callback,
            last_seen: Mutex::new(Observed::of(baseline.as_ref())),
            active: AtomicBool::new(true),
        });

        let sub_id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        self.shared
            .watches
            .write()
            .insert(sub_id, Arc::clone(&watch));
        self.ensure_running();

        debug!(entry = %watch.id, subscription = sub_id, "subscribed");
        Ok(Subscription {
            sub_id,
            watch,
            shared: Arc::downgrade(&self.shared),
        })
    }

    /// Number of connected subscriptions.
    pub(crate) fn active_count(&self) -> usize {
        self.shared.watches.read().len()
    }

    fn ensure_running(&self) {
        let mut task = self.task.lock();
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let shared = Arc::downgrade(&self.shared);
        let period = self.interval;
        debug!(interval_ms = period.as_millis() as u64, "starting subscription poller");
        *task = Some(tokio::spawn(run_poller(shared, period)));
    }
}

impl Drop for SubscriptionPoller {
    fn drop(&mut self) {
        if let Some(handle) = self.task.get_mut().take() {
            handle.abort();
        }
    }
}

async fn run_poller(shared: Weak<PollerShared>, period: Duration) {
    let mut ticks = interval_at(Instant::now() + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticks.tick().await;
        let Some(shared) = shared.upgrade() else {
            break;
        };
        shared.poll_once().await;
    }
    debug!("subscription poller stopped");
}

/// A live `on_update` registration.
///
/// Dropping the handle does not disconnect it; call
/// [`Subscription::disconnect`]. Subscriptions end when their client is
/// dropped.
pub struct Subscription {
    sub_id: u64,
    watch: Arc<Watch>,
    shared: Weak<PollerShared>,
}

impl Subscription {
    /// Stops notifications. Idempotent.
    ///
    /// Once this returns the callback will not be invoked again, unless an
    /// invocation is already running on the poller task.
    pub fn disconnect(&self) {
        if !self.watch.active.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(shared) = self.shared.upgrade() {
            shared.watches.write().remove(&self.sub_id);
        }
        debug!(entry = %self.watch.id, subscription = self.sub_id, "disconnected");
    }

    /// Returns true until [`Subscription::disconnect`] is called.
    pub fn is_connected(&self) -> bool {
        self.watch.is_active()
    }

    /// Returns the watched key.
    pub fn key(&self) -> &str {
        &self.watch.id.key
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.sub_id)
            .field("entry", &self.watch.id)
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use verstore_remote::{EntryWrite, InMemoryEntryStore, StoreKind, DEFAULT_SCOPE};

    const TICK: Duration = Duration::from_millis(100);

    fn id(key: &str) -> EntryId {
        EntryId::new("players", DEFAULT_SCOPE, StoreKind::Standard, key)
    }

    fn recorder() -> (UpdateCallback, Arc<Mutex<Vec<Option<Value>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: UpdateCallback = Arc::new(move |value| sink.lock().push(value));
        (callback, seen)
    }

    async fn write(remote: &InMemoryEntryStore, key: &str, value: Value) {
        remote
            .upsert_entry(&id(key), EntryWrite::standard(value), None)
            .await
            .unwrap();
    }

    /// Lets the poller task observe one tick.
    async fn tick() {
        tokio::time::sleep(TICK + Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn fires_on_change_and_once_on_delete() {
        let remote = Arc::new(InMemoryEntryStore::new());
        let poller = SubscriptionPoller::new(remote.clone(), TICK);
        write(&remote, "k", json!(1)).await;

        let (callback, seen) = recorder();
        let _sub = poller.subscribe(id("k"), callback).await.unwrap();

        tick().await;
        assert!(seen.lock().is_empty(), "baseline must not fire");

        write(&remote, "k", json!(2)).await;
        tick().await;
        assert_eq!(*seen.lock(), vec![Some(json!(2))]);

        remote.delete_entry(&id("k")).await.unwrap();
        tick().await;
        tick().await;
        assert_eq!(*seen.lock(), vec![Some(json!(2)), None]);
    }

    #[tokio::test(start_paused = true)]
    async fn rewrite_with_same_value_still_fires() {
        let remote = Arc::new(InMemoryEntryStore::new());
        let poller = SubscriptionPoller::new(remote.clone(), TICK);
        write(&remote, "k", json!("same")).await;

        let (callback, seen) = recorder();
        let _sub = poller.subscribe(id("k"), callback).await.unwrap();

        write(&remote, "k", json!("same")).await;
        tick().await;
        assert_eq!(*seen.lock(), vec![Some(json!("same"))]);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_is_idempotent_and_silences() {
        let remote = Arc::new(InMemoryEntryStore::new());
        let poller = SubscriptionPoller::new(remote.clone(), TICK);

        let (callback, seen) = recorder();
        let sub = poller.subscribe(id("k"), callback).await.unwrap();
        assert_eq!(poller.active_count(), 1);

        sub.disconnect();
        sub.disconnect();
        assert!(!sub.is_connected());
        assert_eq!(poller.active_count(), 0);

        write(&remote, "k", json!(1)).await;
        tick().await;
        assert!(seen.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_handle_stays_connected() {
        let remote = Arc::new(InMemoryEntryStore::new());
        let poller = SubscriptionPoller::new(remote.clone(), TICK);

        let (callback, seen) = recorder();
        drop(poller.subscribe(id("k"), callback).await.unwrap());

        write(&remote, "k", json!(7)).await;
        tick().await;
        assert_eq!(*seen.lock(), vec![Some(json!(7))]);
    }
}
