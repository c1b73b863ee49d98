//! Entry identity and record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Scope used when a store is opened without an explicit scope.
pub const DEFAULT_SCOPE: &str = "global";

/// The kind of store an entry belongs to.
///
/// Standard and ordered stores with the same name and scope are distinct
/// namespaces; a key written through one is invisible to the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// Arbitrary JSON values.
    Standard,
    /// Numeric values with a sort key.
    Ordered,
}

impl StoreKind {
    /// Returns the lowercase name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKind::Standard => "standard",
            StoreKind::Ordered => "ordered",
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A (store name, scope, kind) coordinate.
///
/// Every store handle is bound to exactly one coordinate; listing
/// operations never cross coordinates.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StoreCoordinate {
    /// Store name.
    pub store_name: String,
    /// Scope within the store.
    pub scope: String,
    /// Store kind.
    pub kind: StoreKind,
}

impl StoreCoordinate {
    /// Creates a new coordinate.
    pub fn new(store_name: impl Into<String>, scope: impl Into<String>, kind: StoreKind) -> Self {
        Self {
            store_name: store_name.into(),
            scope: scope.into(),
            kind,
        }
    }

    /// Returns the identity of `key` within this coordinate.
    pub fn entry_id(&self, key: impl Into<String>) -> EntryId {
        EntryId {
            coordinate: self.clone(),
            key: key.into(),
        }
    }
}

impl fmt::Display for StoreCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.store_name, self.scope, self.kind)
    }
}

/// Unique identity of an entry: coordinate plus key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryId {
    /// The coordinate the entry lives in.
    pub coordinate: StoreCoordinate,
    /// Key within the coordinate.
    pub key: String,
}

impl EntryId {
    /// Creates a new entry identity.
    pub fn new(
        store_name: impl Into<String>,
        scope: impl Into<String>,
        kind: StoreKind,
        key: impl Into<String>,
    ) -> Self {
        StoreCoordinate::new(store_name, scope, kind).entry_id(key)
    }

    /// Returns the store kind.
    pub fn kind(&self) -> StoreKind {
        self.coordinate.kind
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.coordinate, self.key)
    }
}

/// The payload of a write: value plus optional sort key.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryWrite {
    /// The value to store.
    pub value: Value,
    /// Sort key, present only for ordered entries.
    pub sort_value: Option<f64>,
}

impl EntryWrite {
    /// Creates a write for a standard entry.
    pub fn standard(value: Value) -> Self {
        Self {
            value,
            sort_value: None,
        }
    }

    /// Creates a write for an ordered entry.
    ///
    /// Negative zero is stored as zero so it ties with `0.0` and falls back
    /// to key order.
    pub fn ordered(value: Value, sort_value: f64) -> Self {
        let sort_value = if sort_value == 0.0 { 0.0 } else { sort_value };
        Self {
            value,
            sort_value: Some(sort_value),
        }
    }
}

/// A stored entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Identity of the entry.
    pub id: EntryId,
    /// Stored value.
    pub value: Value,
    /// Sort key for ordered entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_value: Option<f64>,
    /// Version, starting at 1 on creation.
    pub version: u64,
    /// Time of the last successful write, assigned by the store.
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    /// Returns the entry key.
    pub fn key(&self) -> &str {
        &self.id.key
    }
}
