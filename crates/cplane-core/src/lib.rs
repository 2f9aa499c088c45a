//! cplane core - the surface over the artifact store and patch classifier
//!
//! - [`Dispatcher`]: one JSON request with an `action` field in, one JSON
//!   object out (`lookup`, `store`, `invalidate`, `stats`, `validate`)
//! - [`EditGuard`]: the pre-edit enforcement hook
//! - [`Config`]: environment configuration
//! - [`logging`]: subscriber setup for the `cplane` binary
//!
//! # Example
//!
//! ```rust,no_run
//! use cplane_core::{Config, Dispatcher};
//! use cplane_store::{ArtifactStore, ExecContext};
//!
//! let config = Config::from_env();
//! let store = ArtifactStore::new(config.store_config(), ExecContext::new("/path/to/repo"));
//! let dispatcher = Dispatcher::new(store);
//!
//! match dispatcher.handle_json(r#"{"action": "stats", "namespace": "symbols"}"#) {
//!     Ok(payload) => println!("{payload}"),
//!     Err(e) => println!("{}", e.envelope()),
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod actions;
pub mod config;
pub mod error;
pub mod guard;
pub mod logging;

pub use actions::{Action, ActionRequest, Dispatcher, ValidateRequest};
pub use config::{Config, CACHE_DIR_ENV, LOG_ENV};
pub use error::{ActionError, ActionResult, GuardError};
pub use guard::{EditGuard, HookPayload, GUARDED_TOOL};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
