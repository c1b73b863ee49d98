//! # verstore Remote
//!
//! Remote entry store contract and reference stores for verstore.
//!
//! This crate provides the lowest-level storage abstraction for verstore.
//! A remote entry store offers only primitive single-entry operations:
//! fetch, conditional upsert, delete and paged listing. It has no locking
//! and no transactions; all datastore semantics live in `verstore_core`.
//!
//! ## Design Principles
//!
//! - One entry per (store name, scope, store kind, key)
//! - Every write bumps the entry version by one
//! - Conditional upserts are the only concurrency primitive
//! - Cursors are opaque tokens owned by the store
//! - Must be `Send + Sync` for concurrent access
//!
//! ## Available Stores
//!
//! - [`InMemoryEntryStore`] - For testing and ephemeral data
//! - [`FileEntryStore`] - JSON file persisted through atomic renames

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod entry;
mod error;
mod file;
mod memory;
mod store;
mod table;

pub use entry::{Entry, EntryId, EntryWrite, StoreCoordinate, StoreKind, DEFAULT_SCOPE};
pub use error::{RemoteError, RemoteResult};
pub use file::FileEntryStore;
pub use memory::InMemoryEntryStore;
pub use store::{Cursor, ListFilter, ListPage, RemoteEntryStore};
