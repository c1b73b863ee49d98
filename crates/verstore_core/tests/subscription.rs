//! Polling subscriptions through the client API.

use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use verstore_core::CoreError;
use verstore_remote::{EntryId, EntryWrite, InMemoryEntryStore, RemoteEntryStore, StoreKind};
use verstore_testkit::{fast_config, FaultyStore, TestClient, FAST_POLL_INTERVAL};

type Seen = Arc<Mutex<Vec<Option<Value>>>>;

fn recorder() -> (impl Fn(Option<Value>) + Send + Sync + 'static, Seen) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (move |value| sink.lock().push(value), seen)
}

async fn next_tick() {
    tokio::time::sleep(FAST_POLL_INTERVAL + Duration::from_millis(1)).await;
}

#[tokio::test(start_paused = true)]
async fn notifies_each_change_after_subscribing() {
    let fixture = TestClient::memory();
    let store = fixture.store("players");
    store.set("alice", json!(1), None).await.unwrap();

    let (callback, seen) = recorder();
    let sub = store.on_update("alice", callback).await.unwrap();
    assert_eq!(sub.key(), "alice");
    assert_eq!(fixture.active_subscriptions(), 1);

    next_tick().await;
    assert!(seen.lock().is_empty());

    store.set("alice", json!(2), None).await.unwrap();
    next_tick().await;
    store.increment("alice", 3).await.unwrap();
    next_tick().await;

    assert_eq!(*seen.lock(), vec![Some(json!(2)), Some(json!(5))]);
}

#[tokio::test(start_paused = true)]
async fn writes_within_one_interval_coalesce() {
    let fixture = TestClient::memory();
    let store = fixture.store("players");

    let (callback, seen) = recorder();
    let _sub = store.on_update("bob", callback).await.unwrap();

    store.set("bob", json!("a"), None).await.unwrap();
    store.set("bob", json!("b"), None).await.unwrap();
    next_tick().await;

    assert_eq!(*seen.lock(), vec![Some(json!("b"))]);
}

#[tokio::test(start_paused = true)]
async fn deletion_fires_once_then_recreate_fires() {
    let fixture = TestClient::memory();
    let store = fixture.store("players");
    store.set("carol", json!(1), None).await.unwrap();

    let (callback, seen) = recorder();
    let _sub = store.on_update("carol", callback).await.unwrap();

    store.remove("carol").await.unwrap();
    next_tick().await;
    next_tick().await;
    store.set("carol", json!(1), None).await.unwrap();
    next_tick().await;

    assert_eq!(*seen.lock(), vec![None, Some(json!(1))]);
}

#[tokio::test(start_paused = true)]
async fn disconnect_stops_notifications() {
    let fixture = TestClient::memory();
    let store = fixture.store("players");

    let (callback, seen) = recorder();
    let sub = store.on_update("dave", callback).await.unwrap();
    store.set("dave", json!(1), None).await.unwrap();
    next_tick().await;

    sub.disconnect();
    assert_eq!(fixture.active_subscriptions(), 0);
    store.set("dave", json!(2), None).await.unwrap();
    next_tick().await;

    assert_eq!(*seen.lock(), vec![Some(json!(1))]);
}

#[tokio::test(start_paused = true)]
async fn failed_polls_are_retried_next_tick() {
    let faulty = Arc::new(FaultyStore::new(InMemoryEntryStore::new()));
    let fixture = TestClient::over(faulty.clone(), fast_config());
    let store = fixture.store("players");

    let (callback, seen) = recorder();
    let _sub = store.on_update("erin", callback).await.unwrap();

    let id = EntryId::new("players", "global", StoreKind::Standard, "erin");
    faulty
        .inner()
        .upsert_entry(&id, EntryWrite::standard(json!(1)), None)
        .await
        .unwrap();

    faulty.set_offline(true);
    next_tick().await;
    assert!(seen.lock().is_empty());

    faulty.set_offline(false);
    next_tick().await;
    assert_eq!(*seen.lock(), vec![Some(json!(1))]);
}

#[tokio::test(start_paused = true)]
async fn subscribing_while_offline_fails() {
    let faulty = Arc::new(FaultyStore::new(InMemoryEntryStore::new()));
    let fixture = TestClient::over(faulty.clone(), fast_config());
    let store = fixture.store("players");

    faulty.set_offline(true);
    let (callback, _) = recorder();
    let result = store.on_update("frank", callback).await;
    assert!(matches!(result, Err(CoreError::RemoteUnavailable { .. })));
    assert_eq!(fixture.active_subscriptions(), 0);
}

#[tokio::test(start_paused = true)]
async fn polling_stops_with_the_client() {
    let remote = Arc::new(InMemoryEntryStore::new());
    let fixture = TestClient::over(remote.clone(), fast_config());
    let store = fixture.store("players");

    let (callback, seen) = recorder();
    let sub = store.on_update("gina", callback).await.unwrap();
    drop(store);
    drop(fixture);

    let id = EntryId::new("players", "global", StoreKind::Standard, "gina");
    remote
        .upsert_entry(&id, EntryWrite::standard(json!(1)), None)
        .await
        .unwrap();
    next_tick().await;
    next_tick().await;

    assert!(seen.lock().is_empty());
    assert!(sub.is_connected());
}

#[tokio::test(start_paused = true)]
async fn unset_key_fires_once_on_first_write() {
    let fixture = TestClient::memory();
    let store = fixture.store("players");

    let (callback, seen) = recorder();
    let sub = store.on_update("new", callback).await.unwrap();

    store.set("new", json!("x"), None).await.unwrap();
    next_tick().await;
    next_tick().await;
    assert_eq!(*seen.lock(), vec![Some(json!("x"))]);

    sub.disconnect();
    store.set("new", json!("y"), None).await.unwrap();
    next_tick().await;
    assert_eq!(seen.lock().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn subscriptions_share_one_poller() {
    let fixture = TestClient::memory();
    let a = fixture.store("a");
    let b = fixture.store("b");

    let (first, seen_a) = recorder();
    let (second, seen_b) = recorder();
    let _sa = a.on_update("k", first).await.unwrap();
    let _sb = b.on_update("k", second).await.unwrap();
    assert_eq!(fixture.active_subscriptions(), 2);

    b.set("k", json!(1), None).await.unwrap();
    next_tick().await;

    assert!(seen_a.lock().is_empty());
    assert_eq!(*seen_b.lock(), vec![Some(json!(1))]);
}
