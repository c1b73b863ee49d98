//! Listing commands: keys, sorted and stores.

use super::{Format, StoreArgs};
use serde::Serialize;
use verstore_core::{DataStoreClient, Pages, SortedEntry};
use verstore_remote::Cursor;

/// Listing result for JSON output.
#[derive(Debug, Serialize)]
pub struct ListingResult<T> {
    /// Listed rows.
    pub items: Vec<T>,
    /// Cursor to resume from, if the listing was cut short by `limit`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Drains pages until `limit` rows are collected or the listing ends.
async fn drain<T: Send>(
    mut pages: Pages<T>,
    limit: Option<usize>,
) -> Result<ListingResult<T>, Box<dyn std::error::Error>> {
    let mut items = Vec::new();
    while !pages.is_finished() && limit.map_or(true, |max| items.len() < max) {
        pages.advance_to_next_page().await?;
        items.extend(pages.take_current_page());
    }

    let mut next_cursor = pages.cursor().map(ToString::to_string);
    if let Some(max) = limit {
        if items.len() > max {
            items.truncate(max);
            // A cursor would skip the truncated rows.
            next_cursor = None;
        }
    }
    Ok(ListingResult { items, next_cursor })
}

fn render_rows<T: Serialize>(
    result: &ListingResult<T>,
    format: Format,
    row: impl Fn(&T) -> String,
) -> Result<String, Box<dyn std::error::Error>> {
    match format {
        Format::Json => Ok(serde_json::to_string_pretty(result)?),
        Format::Text => {
            let mut lines: Vec<String> = result.items.iter().map(row).collect();
            if let Some(cursor) = &result.next_cursor {
                lines.push(format!("-- more (cursor: {cursor})"));
            }
            Ok(lines.join("\n"))
        }
    }
}

/// Runs the keys command, resuming after `cursor` when given.
pub async fn keys(
    client: &DataStoreClient,
    target: &StoreArgs,
    prefix: Option<&str>,
    page_size: Option<u32>,
    limit: Option<usize>,
    cursor: Option<&str>,
    format: Format,
) -> Result<String, Box<dyn std::error::Error>> {
    let pages = target
        .standard(client)?
        .list_keys(prefix, page_size, cursor.map(Cursor::new))?;
    let result = drain(pages, limit).await?;
    render_rows(&result, format, |key| key.clone())
}

/// Runs the sorted command.
///
/// A resumed listing must repeat the direction and bounds it started with.
#[allow(clippy::too_many_arguments)]
pub async fn sorted(
    client: &DataStoreClient,
    target: &StoreArgs,
    descending: bool,
    min: Option<f64>,
    max: Option<f64>,
    page_size: Option<u32>,
    limit: Option<usize>,
    cursor: Option<&str>,
    format: Format,
) -> Result<String, Box<dyn std::error::Error>> {
    let store = target.ordered(client)?;
    let pages = match cursor {
        Some(token) => {
            store.get_sorted_from(!descending, page_size, min, max, Cursor::new(token))?
        }
        None => store.get_sorted(!descending, page_size, min, max)?,
    };
    let result = drain(pages, limit).await?;
    render_rows(&result, format, |entry: &SortedEntry| {
        format!("{}\t{}", entry.key, entry.value)
    })
}

/// Runs the stores command.
pub async fn stores(
    client: &DataStoreClient,
    prefix: Option<&str>,
    format: Format,
) -> Result<String, Box<dyn std::error::Error>> {
    let pages = client.list_data_stores(prefix, None, None)?;
    let result = drain(pages, None).await?;
    render_rows(&result, format, |name| name.clone())
}
