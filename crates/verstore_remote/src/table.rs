//! Ordered entry table shared by the reference stores.

use crate::entry::{Entry, EntryId, EntryWrite, StoreCoordinate};
use crate::error::{RemoteError, RemoteResult};
use crate::store::{Cursor, ListFilter, ListPage};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Last emitted listing position, carried inside a [`Cursor`].
///
/// Cursors record where a page ended rather than an offset, so a listing
/// stays consistent while other writers insert or delete entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Position {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sort: Option<f64>,
    key: String,
}

impl Position {
    fn of_key(key: &str) -> Self {
        Self {
            sort: None,
            key: key.to_string(),
        }
    }

    fn encode(&self) -> RemoteResult<Cursor> {
        serde_json::to_string(self)
            .map(Cursor::new)
            .map_err(|e| RemoteError::InvalidCursor(e.to_string()))
    }

    fn decode(cursor: &Cursor) -> RemoteResult<Self> {
        serde_json::from_str(cursor.as_str())
            .map_err(|e| RemoteError::InvalidCursor(format!("{cursor}: {e}")))
    }
}

/// Sort order used by range listings: sort value in the requested
/// direction, then key ascending.
fn sorted_order(a: (f64, &str), b: (f64, &str), ascending: bool) -> Ordering {
    let by_value = if ascending {
        a.0.total_cmp(&b.0)
    } else {
        b.0.total_cmp(&a.0)
    };
    by_value.then_with(|| a.1.cmp(b.1))
}

/// Takes one page plus a lookahead item to decide whether a cursor is due.
fn paginate<T>(
    items: impl Iterator<Item = T>,
    page_size: u32,
    position: impl Fn(&T) -> Position,
) -> RemoteResult<ListPage<T>> {
    let page_size = page_size.max(1) as usize;
    let mut page: Vec<T> = items.take(page_size + 1).collect();

    let next_cursor = if page.len() > page_size {
        page.truncate(page_size);
        page.last().map(|item| position(item).encode()).transpose()?
    } else {
        None
    };

    Ok(ListPage::new(page, next_cursor))
}

/// An ordered table of entries keyed by identity.
///
/// Implements the version and listing rules of the store contract; the
/// stores add locking and persistence around it.
#[derive(Debug, Default, Clone)]
pub(crate) struct EntryTable {
    entries: BTreeMap<EntryId, Entry>,
}

impl EntryTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_entries(entries: Vec<Entry>) -> Self {
        Self {
            entries: entries.into_iter().map(|e| (e.id.clone(), e)).collect(),
        }
    }

    pub(crate) fn to_entries(&self) -> Vec<Entry> {
        self.entries.values().cloned().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn get(&self, id: &EntryId) -> Option<Entry> {
        self.entries.get(id).cloned()
    }

    pub(crate) fn upsert(
        &mut self,
        id: &EntryId,
        write: EntryWrite,
        expected_version: Option<u64>,
    ) -> RemoteResult<Entry> {
        let current = self.entries.get(id).map_or(0, |e| e.version);

        if let Some(expected) = expected_version {
            if expected != current {
                return Err(RemoteError::VersionConflict {
                    expected,
                    actual: current,
                });
            }
        }

        let entry = Entry {
            id: id.clone(),
            value: write.value,
            sort_value: write.sort_value,
            version: current + 1,
            updated_at: Utc::now(),
        };
        self.entries.insert(id.clone(), entry.clone());
        Ok(entry)
    }

    pub(crate) fn delete(&mut self, id: &EntryId) -> Option<Entry> {
        self.entries.remove(id)
    }

    fn coordinate_entries<'a>(
        &'a self,
        coordinate: &'a StoreCoordinate,
    ) -> impl Iterator<Item = &'a Entry> + 'a {
        let start = coordinate.entry_id(String::new());
        self.entries
            .range(start..)
            .take_while(move |(id, _)| id.coordinate == *coordinate)
            .map(|(_, entry)| entry)
    }

    pub(crate) fn list(
        &self,
        coordinate: &StoreCoordinate,
        filter: &ListFilter,
        cursor: Option<&Cursor>,
        page_size: u32,
    ) -> RemoteResult<ListPage<Entry>> {
        let after = cursor.map(Position::decode).transpose()?;

        match filter {
            ListFilter::Prefix(prefix) => {
                let prefix = prefix.as_deref().unwrap_or("");
                let items = self
                    .coordinate_entries(coordinate)
                    .filter(|e| e.key().starts_with(prefix))
                    .filter(|e| after.as_ref().map_or(true, |p| e.key() > p.key.as_str()))
                    .cloned();
                paginate(items, page_size, |e| Position::of_key(e.key()))
            }
            ListFilter::Range {
                min,
                max,
                ascending,
            } => {
                let mut matching: Vec<(f64, &Entry)> = self
                    .coordinate_entries(coordinate)
                    .filter_map(|e| e.sort_value.map(|sv| (sv, e)))
                    .filter(|(sv, _)| min.map_or(true, |m| *sv >= m))
                    .filter(|(sv, _)| max.map_or(true, |m| *sv <= m))
                    .collect();
                matching.sort_by(|a, b| sorted_order((a.0, a.1.key()), (b.0, b.1.key()), *ascending));

                if let Some(p) = &after {
                    let sort = p.sort.ok_or_else(|| {
                        RemoteError::InvalidCursor("range cursor without sort value".into())
                    })?;
                    matching.retain(|(sv, e)| {
                        sorted_order((*sv, e.key()), (sort, p.key.as_str()), *ascending)
                            == Ordering::Greater
                    });
                }

                let items = matching.into_iter().map(|(_, e)| e.clone());
                paginate(items, page_size, |e| Position {
                    sort: e.sort_value,
                    key: e.key().to_string(),
                })
            }
        }
    }

    pub(crate) fn store_names(
        &self,
        prefix: Option<&str>,
        cursor: Option<&Cursor>,
        page_size: u32,
    ) -> RemoteResult<ListPage<String>> {
        let after = cursor.map(Position::decode).transpose()?;
        let prefix = prefix.unwrap_or("");

        let names: BTreeSet<&str> = self
            .entries
            .keys()
            .map(|id| id.coordinate.store_name.as_str())
            .filter(|name| name.starts_with(prefix))
            .filter(|name| after.as_ref().map_or(true, |p| *name > p.key.as_str()))
            .collect();

        paginate(
            names.into_iter().map(str::to_string),
            page_size,
            |name| Position::of_key(name),
        )
    }
}
