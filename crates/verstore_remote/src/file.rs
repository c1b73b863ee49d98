//! File-backed entry store for persistent local use.

use crate::entry::{Entry, EntryId, EntryWrite, StoreCoordinate};
use crate::error::{RemoteError, RemoteResult};
use crate::store::{Cursor, ListFilter, ListPage, RemoteEntryStore};
use crate::table::EntryTable;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, trace};

/// Current on-disk format version.
const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct StoreFile {
    format_version: u32,
    entries: Vec<Entry>,
}

/// A JSON file backed entry store.
///
/// The whole table is kept in memory and rewritten to disk after every
/// mutation. Writes go to a temporary file in the same directory which is
/// then renamed over the store file, so a crash leaves either the old or the
/// new contents, never a torn file.
///
/// # Thread Safety
///
/// Mutations are serialized by an internal lock. The in-memory table only
/// changes after the new contents are durable; a failed write leaves both
/// the file and the table untouched.
///
/// Each mutation rewrites and fsyncs the file on tokio's blocking pool, so
/// async workers are not stalled by disk I/O. Reads are served from memory.
///
/// # Example
///
/// ```no_run
/// use verstore_remote::FileEntryStore;
/// use std::path::Path;
///
/// let store = FileEntryStore::open(Path::new("datastore.json")).unwrap();
/// println!("{} entries", store.len());
/// ```
#[derive(Debug)]
pub struct FileEntryStore {
    inner: Arc<FileState>,
}

#[derive(Debug)]
struct FileState {
    path: PathBuf,
    table: RwLock<EntryTable>,
}

impl FileEntryStore {
    /// Opens the store at `path`, starting empty if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or decoded.
    pub fn open(path: &Path) -> RemoteResult<Self> {
        let table = if path.exists() {
            let bytes = std::fs::read(path)?;
            let file: StoreFile = serde_json::from_slice(&bytes)
                .map_err(|e| RemoteError::Corrupted(format!("{}: {e}", path.display())))?;
            if file.format_version != FORMAT_VERSION {
                return Err(RemoteError::Corrupted(format!(
                    "unsupported format version {} (expected {FORMAT_VERSION})",
                    file.format_version
                )));
            }
            EntryTable::from_entries(file.entries)
        } else {
            EntryTable::new()
        };
        debug!(path = %path.display(), entries = table.len(), "opened file entry store");

        Ok(Self {
            inner: Arc::new(FileState {
                path: path.to_path_buf(),
                table: RwLock::new(table),
            }),
        })
    }

    /// Opens the store, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file cannot
    /// be decoded.
    pub fn open_with_create_dirs(path: &Path) -> RemoteResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    /// Returns the path to the store file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Returns the number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.table.read().len()
    }

    /// Returns true if no entry is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Applies `op` to a copy of the table and swaps it in once persisted.
    async fn mutate<T, F>(&self, op: F) -> RemoteResult<T>
    where
        F: FnOnce(&mut EntryTable) -> RemoteResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let state = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || state.mutate(op))
            .await
            .map_err(|e| RemoteError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
    }
}

impl FileState {
    fn persist(&self, table: &EntryTable) -> RemoteResult<()> {
        let contents = StoreFile {
            format_version: FORMAT_VERSION,
            entries: table.to_entries(),
        };
        let bytes = serde_json::to_vec_pretty(&contents)
            .map_err(|e| RemoteError::Corrupted(e.to_string()))?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| RemoteError::Io(e.error))?;
        trace!(path = %self.path.display(), bytes = bytes.len(), "persisted entry table");
        Ok(())
    }

    fn mutate<T>(&self, op: impl FnOnce(&mut EntryTable) -> RemoteResult<T>) -> RemoteResult<T> {
        let mut table = self.table.write();
        let mut next = table.clone();
        let out = op(&mut next)?;
        self.persist(&next)?;
        *table = next;
        Ok(out)
    }
}

#[async_trait]
impl RemoteEntryStore for FileEntryStore {
    async fn fetch_entry(&self, id: &EntryId) -> RemoteResult<Option<Entry>> {
        Ok(self.inner.table.read().get(id))
    }

    async fn upsert_entry(
        &self,
        id: &EntryId,
        write: EntryWrite,
        expected_version: Option<u64>,
    ) -> RemoteResult<Entry> {
        let id = id.clone();
        self.mutate(move |table| table.upsert(&id, write, expected_version))
            .await
    }

    async fn delete_entry(&self, id: &EntryId) -> RemoteResult<Option<Entry>> {
        if self.inner.table.read().get(id).is_none() {
            return Ok(None);
        }
        let id = id.clone();
        self.mutate(move |table| Ok(table.delete(&id))).await
    }

    async fn list_entries(
        &self,
        coordinate: &StoreCoordinate,
        filter: &ListFilter,
        cursor: Option<&Cursor>,
        page_size: u32,
    ) -> RemoteResult<ListPage<Entry>> {
        self.inner.table.read().list(coordinate, filter, cursor, page_size)
    }

    async fn list_store_names(
        &self,
        prefix: Option<&str>,
        cursor: Option<&Cursor>,
        page_size: u32,
    ) -> RemoteResult<ListPage<String>> {
        self.inner.table.read().store_names(prefix, cursor, page_size)
    }
}
