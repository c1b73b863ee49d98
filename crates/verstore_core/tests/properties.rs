//! Property tests for versioning, increments and sorted order.

use proptest::prelude::*;
use serde_json::Value;
use verstore_remote::{EntryId, StoreKind};
use verstore_testkit::{
    json_value_strategy, key_strategy, score_rows_strategy, small_int_strategy,
    store_name_strategy, TestClient,
};

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build runtime")
        .block_on(future)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn every_write_bumps_version_by_one(
        key in key_strategy(),
        values in prop::collection::vec(json_value_strategy(), 1..8),
    ) {
        block_on(async {
            let fixture = TestClient::memory();
            let store = fixture.store("props");
            let id = EntryId::new("props", "global", StoreKind::Standard, key.as_str());

            for (i, value) in values.iter().enumerate() {
                if i % 2 == 0 {
                    store.set(&key, value.clone(), None).await.unwrap();
                } else {
                    let next = value.clone();
                    store.update(&key, move |_| Some(next.clone())).await.unwrap();
                }
                let entry = fixture.remote.fetch_entry(&id).await.unwrap().unwrap();
                assert_eq!(entry.version, i as u64 + 1);
                assert_eq!(&entry.value, value);
            }
        });
    }

    #[test]
    fn increments_sum_exactly(deltas in prop::collection::vec(small_int_strategy(), 1..20)) {
        block_on(async {
            let fixture = TestClient::memory();
            let store = fixture.store("props");

            let mut last = None;
            for delta in &deltas {
                last = Some(store.increment("sum", *delta).await.unwrap());
            }
            let expected: i64 = deltas.iter().sum();
            assert_eq!(last.and_then(|n| n.as_i64()), Some(expected));
            assert_eq!(store.get("sum").await.unwrap(), Some(Value::from(expected)));
        });
    }

    #[test]
    fn sorted_listing_is_totally_ordered(
        rows in score_rows_strategy(30),
        ascending in any::<bool>(),
        page_size in 1u32..8,
    ) {
        block_on(async {
            let fixture = TestClient::memory();
            let scores = fixture.ordered("props");
            for (key, score) in &rows {
                scores.set(key, *score, None).await.unwrap();
            }

            let listed = scores
                .get_sorted(ascending, Some(page_size), None, None)
                .unwrap()
                .collect_remaining()
                .await
                .unwrap();

            let mut expected = rows.clone();
            expected.sort_by(|a, b| {
                let by_value = if ascending { a.1.cmp(&b.1) } else { b.1.cmp(&a.1) };
                by_value.then_with(|| a.0.cmp(&b.0))
            });
            let listed: Vec<(String, i64)> = listed
                .into_iter()
                .map(|e| (e.key, e.value.as_i64().unwrap()))
                .collect();
            assert_eq!(listed, expected);
        });
    }

    #[test]
    fn store_names_list_once_in_order(
        names in prop::collection::btree_set(store_name_strategy(), 1..12),
        page_size in 1u32..5,
    ) {
        block_on(async {
            let fixture = TestClient::memory();
            for (i, name) in names.iter().enumerate() {
                fixture.store(name).set("k", Value::from(1), None).await.unwrap();
                if i % 2 == 0 {
                    fixture.ordered(name).set("k", 1, None).await.unwrap();
                }
            }

            let listed = fixture
                .list_data_stores(None, Some(page_size), None)
                .unwrap()
                .collect_remaining()
                .await
                .unwrap();
            let expected: Vec<String> = names.into_iter().collect();
            assert_eq!(listed, expected);
        });
    }
}
