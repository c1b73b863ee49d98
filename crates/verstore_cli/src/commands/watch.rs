//! Watch command implementation.

use super::{render, StoreArgs};
use tracing::info;
use verstore_core::DataStoreClient;

/// Prints every change to `key` until interrupted.
pub async fn run(
    client: &DataStoreClient,
    target: &StoreArgs,
    key: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = target.standard(client)?;
    let current = store.get(key).await?;
    println!("{key} = {}", render(current.as_ref()));

    let watched = key.to_string();
    let subscription = store
        .on_update(key, move |value| {
            println!("{watched} = {}", render(value.as_ref()));
        })
        .await?;
    info!(
        store = store.name(),
        key,
        interval_ms = client.config().on_update_poll_interval.as_millis() as u64,
        "watching for changes, press Ctrl-C to stop"
    );

    tokio::signal::ctrl_c().await?;
    subscription.disconnect();
    Ok(())
}
