//! # verstore Core
//!
//! Versioned key-value datastores over a remote entry store.
//!
//! This crate provides:
//! - Standard data stores with get, set, atomic update, increment and remove
//! - Ordered data stores with numeric values and sorted range listing
//! - Lazy cursor-driven pagination over keys, sorted entries and store names
//! - Polling change subscriptions
//! - Conflict retry with exponential backoff
//!
//! ## Concurrency Model
//!
//! The remote store has no locks or transactions. Every atomic operation is
//! an optimistic compare-and-swap on the entry version:
//! 1. Fetch the entry and its version
//! 2. Compute the new value
//! 3. Write it conditionally on the fetched version
//! 4. On conflict, back off and start over
//!
//! ## Key Invariants
//!
//! - Every successful write bumps the entry version by exactly one
//! - An absent entry has version 0; its first write yields version 1
//! - `set` and `remove` are unconditional
//! - `update` never commits a value computed from a stale read
//! - Listings never cross store coordinates

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod config;
mod datastore;
mod error;
mod ordered;
mod pages;
mod subscription;
mod value;

pub use client::{DataStoreClient, RequestType};
pub use config::{
    BackoffConfig, ClientConfig, DEFAULT_GLOBAL_STORE_NAME, DEFAULT_PAGE_SIZE,
    DEFAULT_POLL_INTERVAL, DEFAULT_TABLE_NAME, DEFAULT_UPDATE_RETRIES, MAX_PAGE_SIZE,
};
pub use datastore::{DataStore, SetOptions};
pub use error::{CoreError, CoreResult};
pub use ordered::{OrderedDataStore, SortedEntry};
pub use pages::Pages;
pub use subscription::Subscription;
pub use value::MAX_NAME_LEN;
