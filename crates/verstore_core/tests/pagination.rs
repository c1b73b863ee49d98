//! Paged listing of keys, sorted entries and store names.

use serde_json::json;
use verstore_core::{CoreError, MAX_PAGE_SIZE};
use verstore_remote::Cursor;
use verstore_testkit::{fast_config, seed_numbered, seed_scores, TestClient};

#[tokio::test]
async fn walks_every_key_in_order() {
    let fixture = TestClient::memory();
    let store = fixture.store("items");
    let keys = seed_numbered(&store, "item_", 23).await;

    let mut pages = store.list_keys(None, Some(5), None).unwrap();
    let mut sizes = Vec::new();
    let mut listed = Vec::new();
    while !pages.is_finished() {
        pages.advance_to_next_page().await.unwrap();
        sizes.push(pages.current_page().len());
        listed.extend(pages.take_current_page());
    }

    assert_eq!(sizes, vec![5, 5, 5, 5, 3]);
    assert_eq!(listed, keys);
    assert!(matches!(
        pages.advance_to_next_page().await,
        Err(CoreError::InvalidState { .. })
    ));
}

#[tokio::test]
async fn twenty_five_keys_in_pages_of_ten() {
    let fixture = TestClient::memory();
    let store = fixture.store("items");
    seed_numbered(&store, "key_", 25).await;

    let mut pages = store.list_keys(None, Some(10), None).unwrap();
    let mut observed = Vec::new();
    while !pages.is_finished() {
        pages.advance_to_next_page().await.unwrap();
        observed.push((pages.current_page().len(), pages.is_finished()));
    }

    assert_eq!(observed, vec![(10, false), (10, false), (5, true)]);
}

#[tokio::test]
async fn exact_multiple_ends_without_empty_page() {
    let fixture = TestClient::memory();
    let store = fixture.store("items");
    seed_numbered(&store, "k", 10).await;

    let mut pages = store.list_keys(None, Some(5), None).unwrap();
    pages.advance_to_next_page().await.unwrap();
    assert!(!pages.is_finished());
    pages.advance_to_next_page().await.unwrap();
    assert_eq!(pages.current_page().len(), 5);
    assert!(pages.is_finished());
}

#[tokio::test]
async fn prefix_filters_keys() {
    let fixture = TestClient::memory();
    let store = fixture.store("items");
    seed_numbered(&store, "a_", 3).await;
    seed_numbered(&store, "b_", 4).await;

    let listed = store
        .list_keys(Some("b_"), None, None)
        .unwrap()
        .collect_remaining()
        .await
        .unwrap();
    assert_eq!(listed, vec!["b_0000", "b_0001", "b_0002", "b_0003"]);

    let all = store
        .list_keys(Some(""), None, None)
        .unwrap()
        .collect_remaining()
        .await
        .unwrap();
    assert_eq!(all.len(), 7);
}

#[tokio::test]
async fn resumes_from_saved_cursor() {
    let fixture = TestClient::memory();
    let store = fixture.store("items");
    let keys = seed_numbered(&store, "k", 9).await;

    let mut pages = store.list_keys(None, Some(4), None).unwrap();
    pages.advance_to_next_page().await.unwrap();
    let saved = pages.cursor().cloned().unwrap();
    drop(pages);

    let rest = store
        .list_keys(None, Some(4), Some(saved))
        .unwrap()
        .collect_remaining()
        .await
        .unwrap();
    assert_eq!(rest, keys[4..].to_vec());
}

#[tokio::test]
async fn malformed_cursor_is_rejected() {
    let fixture = TestClient::memory();
    let store = fixture.store("items");
    seed_numbered(&store, "k", 3).await;

    let mut pages = store
        .list_keys(None, None, Some(Cursor::new("not a cursor")))
        .unwrap();
    assert!(matches!(
        pages.advance_to_next_page().await,
        Err(CoreError::InvalidArgument { .. })
    ));
}

#[tokio::test]
async fn listing_observes_writes_between_pages() {
    let fixture = TestClient::memory();
    let store = fixture.store("items");
    seed_numbered(&store, "k", 4).await;

    let mut pages = store.list_keys(None, Some(2), None).unwrap();
    pages.advance_to_next_page().await.unwrap();
    assert_eq!(pages.current_page(), ["k0000", "k0001"]);

    store.set("k0000a", json!(0), None).await.unwrap();
    store.set("k9999", json!(0), None).await.unwrap();
    store.remove("k0002").await.unwrap();

    let rest = pages.collect_remaining().await.unwrap();
    assert_eq!(rest, vec!["k0003", "k9999"]);
}

#[tokio::test]
async fn oversized_pages_are_clamped() {
    let fixture = TestClient::memory();
    let store = fixture.store("items");
    seed_numbered(&store, "k", MAX_PAGE_SIZE as usize + 20).await;

    let mut pages = store.list_keys(None, Some(10_000), None).unwrap();
    assert_eq!(pages.page_size(), MAX_PAGE_SIZE);
    pages.advance_to_next_page().await.unwrap();
    assert_eq!(pages.current_page().len(), MAX_PAGE_SIZE as usize);
}

#[tokio::test]
async fn default_page_size_comes_from_config() {
    let fixture = TestClient::memory_with(fast_config().with_default_page_size(3));
    let store = fixture.store("items");
    seed_numbered(&store, "k", 7).await;

    let mut pages = store.list_keys(None, None, None).unwrap();
    pages.advance_to_next_page().await.unwrap();
    assert_eq!(pages.current_page().len(), 3);
}

#[tokio::test]
async fn sorted_pages_across_ties() {
    let fixture = TestClient::memory();
    let scores = fixture.ordered("scores");
    seed_scores(
        &scores,
        &[("e", 3), ("a", 3), ("c", 3), ("b", 9), ("d", 1)],
    )
    .await;

    let mut pages = scores.get_sorted(false, Some(2), None, None).unwrap();
    let mut order = Vec::new();
    while !pages.is_finished() {
        pages.advance_to_next_page().await.unwrap();
        order.extend(pages.take_current_page().into_iter().map(|e| e.key));
    }
    assert_eq!(order, vec!["b", "a", "c", "e", "d"]);
}

#[tokio::test]
async fn sorted_bounds_are_inclusive() {
    let fixture = TestClient::memory();
    let scores = fixture.ordered("scores");
    seed_scores(&scores, &[("a", 1), ("b", 5), ("c", 10), ("d", 11)]).await;

    let rows = scores
        .get_sorted(true, None, Some(5.0), Some(10.0))
        .unwrap()
        .collect_remaining()
        .await
        .unwrap();
    let keys: Vec<_> = rows.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["b", "c"]);

    let only_min = scores
        .get_sorted(true, None, Some(10.0), None)
        .unwrap()
        .collect_remaining()
        .await
        .unwrap();
    assert_eq!(only_min.len(), 2);
}

#[tokio::test]
async fn store_names_are_prefix_filtered() {
    let fixture = TestClient::memory();
    for name in ["player_eu", "player_us", "guilds"] {
        fixture.store(name).set("k", json!(1), None).await.unwrap();
    }

    let names = fixture
        .list_data_stores(Some("player_"), None, None)
        .unwrap()
        .collect_remaining()
        .await
        .unwrap();
    assert_eq!(names, vec!["player_eu", "player_us"]);
}

#[tokio::test]
async fn empty_stores_are_not_listed() {
    let fixture = TestClient::memory();
    let store = fixture.store("transient");
    store.set("k", json!(1), None).await.unwrap();
    store.remove("k").await.unwrap();

    let mut pages = fixture.list_data_stores(None, None, None).unwrap();
    pages.advance_to_next_page().await.unwrap();
    assert!(pages.current_page().is_empty());
    assert!(pages.is_finished());
}
