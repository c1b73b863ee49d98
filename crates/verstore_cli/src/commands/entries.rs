//! Single-entry commands: get, set, increment and remove.

use super::{parse_value, render, StoreArgs};
use serde_json::{Number, Value};
use verstore_core::{CoreError, DataStoreClient};

/// Runs the get command.
///
/// With `strict`, a missing key is an error instead of `(nil)`.
pub async fn get(
    client: &DataStoreClient,
    target: &StoreArgs,
    key: &str,
    ordered: bool,
    strict: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    let value = if ordered {
        target.ordered(client)?.get(key).await?.map(Value::Number)
    } else {
        target.standard(client)?.get(key).await?
    };

    if strict && value.is_none() {
        let store = target.store.clone().unwrap_or_else(|| client.config().global_data_store_name.clone());
        return Err(CoreError::not_found(store, key).into());
    }
    Ok(render(value.as_ref()))
}

/// Runs the set command and reports the previous value.
pub async fn set(
    client: &DataStoreClient,
    target: &StoreArgs,
    key: &str,
    raw_value: &str,
    ordered: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    let value = parse_value(raw_value);
    let previous = if ordered {
        target
            .ordered(client)?
            .set(key, value, None)
            .await?
            .map(Value::Number)
    } else {
        target.standard(client)?.set(key, value, None).await?
    };
    Ok(format!("previous: {}", render(previous.as_ref())))
}

/// Runs the increment command and reports the new number.
pub async fn increment(
    client: &DataStoreClient,
    target: &StoreArgs,
    key: &str,
    raw_delta: &str,
    ordered: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    let delta: Number = serde_json::from_str(raw_delta)
        .map_err(|_| format!("delta must be a number, got {raw_delta:?}"))?;

    let sum = if ordered {
        target.ordered(client)?.increment(key, delta).await?
    } else {
        target.standard(client)?.increment(key, delta).await?
    };
    Ok(sum.to_string())
}

/// Runs the remove command and reports the removed value.
pub async fn remove(
    client: &DataStoreClient,
    target: &StoreArgs,
    key: &str,
    ordered: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    let removed = if ordered {
        target.ordered(client)?.remove(key).await?.map(Value::Number)
    } else {
        target.standard(client)?.remove(key).await?
    };
    Ok(format!("removed: {}", render(removed.as_ref())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use verstore_core::ClientConfig;
    use verstore_remote::FileEntryStore;

    fn client(dir: &tempfile::TempDir) -> DataStoreClient {
        let store = FileEntryStore::open_with_create_dirs(&dir.path().join("store.json")).unwrap();
        DataStoreClient::new(ClientConfig::default(), Arc::new(store))
    }

    fn target(store: &str) -> StoreArgs {
        StoreArgs {
            store: Some(store.to_string()),
            scope: None,
        }
    }

    #[tokio::test]
    async fn set_get_remove_round() {
        let dir = tempfile::tempdir().unwrap();
        let client = client(&dir);
        let players = target("players");

        assert_eq!(set(&client, &players, "alice", "{\"lvl\":3}", false).await.unwrap(), "previous: (nil)");
        assert_eq!(get(&client, &players, "alice", false, false).await.unwrap(), "{\"lvl\":3}");
        assert_eq!(remove(&client, &players, "alice", false).await.unwrap(), "removed: {\"lvl\":3}");
        assert_eq!(get(&client, &players, "alice", false, false).await.unwrap(), "(nil)");
    }

    #[tokio::test]
    async fn strict_get_fails_on_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let client = client(&dir);

        let err = get(&client, &target("players"), "ghost", false, true).await.unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[tokio::test]
    async fn increments_ordered_and_rejects_bad_delta() {
        let dir = tempfile::tempdir().unwrap();
        let client = client(&dir);
        let scores = target("scores");

        assert_eq!(increment(&client, &scores, "alice", "5", true).await.unwrap(), "5");
        assert_eq!(increment(&client, &scores, "alice", "2", true).await.unwrap(), "7");
        assert!(increment(&client, &scores, "alice", "two", true).await.is_err());
        assert!(set(&client, &scores, "bob", "not a number", true).await.is_err());
    }

    #[tokio::test]
    async fn defaults_to_global_store() {
        let dir = tempfile::tempdir().unwrap();
        let client = client(&dir);

        set(&client, &StoreArgs::default(), "motd", "hello", false).await.unwrap();
        let global = client.get_global_data_store().unwrap();
        assert_eq!(global.get("motd").await.unwrap(), Some(Value::from("hello")));
    }
}
