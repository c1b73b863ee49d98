//! # verstore Testkit
//!
//! Test utilities for verstore.
//!
//! This crate provides:
//! - Client fixtures over in-memory and file stores
//! - A fault-injecting remote store wrapper
//! - Property-based test generators using proptest
//! - Concurrency stress helpers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use verstore_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn counts_visits() {
//!     let fixture = TestClient::memory();
//!     let store = fixture.store("visits");
//!     store.increment("home", 1).await.unwrap();
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod faulty;
pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::faulty::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use faulty::*;
pub use fixtures::*;
pub use generators::*;
pub use stress::*;
