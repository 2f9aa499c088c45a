//! cplane artifact store
//!
//! A namespaced, content-addressed cache for the results of expensive
//! analyses, persisted as one JSON file per entry.
//!
//! # Core Concepts
//!
//! - [`ArtifactStore`]: lookup / store / invalidate / stats over a cache root
//! - [`CacheId`]: SHA-256 of namespace, key and canonical extra data
//! - [`KeyExtra`]: order-independent rendering of structured key data
//! - [`Namespace`]: sanitized partition name, one directory per namespace
//!
//! # Example
//!
//! ```rust,no_run
//! use cplane_store::{ArtifactStore, ExecContext, KeyExtra, Namespace, StoreConfig, StoreOptions};
//! use serde_json::json;
//!
//! # fn example() -> Result<(), cplane_store::StoreError> {
//! let store = ArtifactStore::new(StoreConfig::new(), ExecContext::new("/path/to/repo"));
//! let ns = Namespace::new("symbol-scan");
//! let extra = KeyExtra::from_value(&json!({"depth": 2}));
//!
//! if !store.lookup(&ns, "src/lib.rs@abc123", &extra)?.is_hit() {
//!     let scan = String::from("...expensive result...");
//!     store.store(&ns, "src/lib.rs@abc123", &extra, scan, StoreOptions::default())?;
//! }
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod canonical;
mod entry;
mod error;
mod fs;
mod id;
mod namespace;
mod root;
mod store;

pub use canonical::{canonical_json, KeyExtra};
pub use entry::{expiry, CacheEntry, KEY_PREVIEW_LEN};
pub use error::{StoreError, StoreResult};
pub use id::{CacheId, IdError};
pub use namespace::{Namespace, DEFAULT_NAMESPACE, MAX_NAMESPACE_LEN};
pub use root::{ExecContext, StoreConfig, DEFAULT_CACHE_DIR};
pub use store::{
    ArtifactStore, InvalidateReport, LookupOutcome, StatsReport, StoreOptions, StoreOutcome,
    StoreReceipt, DEFAULT_MAX_BYTES,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
