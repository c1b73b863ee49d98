//! Contract tests run against every reference store.

use serde_json::json;
use std::sync::Arc;
use verstore_remote::{
    EntryId, EntryWrite, FileEntryStore, InMemoryEntryStore, ListFilter, RemoteEntryStore,
    RemoteError, StoreCoordinate, StoreKind,
};

fn stores() -> (Vec<Arc<dyn RemoteEntryStore>>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let file = FileEntryStore::open(&dir.path().join("contract.json")).unwrap();
    (
        vec![Arc::new(InMemoryEntryStore::new()), Arc::new(file)],
        dir,
    )
}

#[tokio::test]
async fn versions_increase_by_one_per_write() {
    let (stores, _dir) = stores();
    for store in stores {
        let id = EntryId::new("profile", "global", StoreKind::Standard, "u1");
        let mut expected = 0;
        for value in 0..5 {
            let entry = store
                .upsert_entry(&id, EntryWrite::standard(json!(value)), Some(expected))
                .await
                .unwrap();
            expected += 1;
            assert_eq!(entry.version, expected);
        }
    }
}

#[tokio::test]
async fn conflicting_write_reports_stored_version() {
    let (stores, _dir) = stores();
    for store in stores {
        let id = EntryId::new("profile", "global", StoreKind::Standard, "u1");
        store
            .upsert_entry(&id, EntryWrite::standard(json!("a")), None)
            .await
            .unwrap();
        store
            .upsert_entry(&id, EntryWrite::standard(json!("b")), None)
            .await
            .unwrap();

        match store
            .upsert_entry(&id, EntryWrite::standard(json!("c")), Some(1))
            .await
        {
            Err(RemoteError::VersionConflict { expected, actual }) => {
                assert_eq!(expected, 1);
                assert_eq!(actual, 2);
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn standard_and_ordered_namespaces_are_separate() {
    let (stores, _dir) = stores();
    for store in stores {
        let standard = EntryId::new("coins", "global", StoreKind::Standard, "k");
        let ordered = EntryId::new("coins", "global", StoreKind::Ordered, "k");

        store
            .upsert_entry(&standard, EntryWrite::standard(json!("text")), None)
            .await
            .unwrap();
        assert!(store.fetch_entry(&ordered).await.unwrap().is_none());

        store
            .upsert_entry(&ordered, EntryWrite::ordered(json!(4), 4.0), None)
            .await
            .unwrap();
        let fetched = store.fetch_entry(&ordered).await.unwrap().unwrap();
        assert_eq!(fetched.sort_value, Some(4.0));
        assert_eq!(fetched.version, 1);
    }
}

#[tokio::test]
async fn listing_walks_every_key_once() {
    let (stores, _dir) = stores();
    for store in stores {
        let coordinate = StoreCoordinate::new("bulk", "global", StoreKind::Standard);
        for i in 0..23 {
            store
                .upsert_entry(
                    &coordinate.entry_id(format!("key{i:02}")),
                    EntryWrite::standard(json!(i)),
                    None,
                )
                .await
                .unwrap();
        }

        let mut seen = Vec::new();
        let mut cursor = None;
        loop {
            let page = store
                .list_entries(&coordinate, &ListFilter::all_keys(), cursor.as_ref(), 5)
                .await
                .unwrap();
            assert!(page.items.len() <= 5);
            seen.extend(page.items.into_iter().map(|e| e.id.key));
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        let expected: Vec<String> = (0..23).map(|i| format!("key{i:02}")).collect();
        assert_eq!(seen, expected);
    }
}
