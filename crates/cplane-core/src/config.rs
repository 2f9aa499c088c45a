//! Process configuration read from the environment

use cplane_store::StoreConfig;
use std::path::PathBuf;

/// Cache root override, absolute or relative to the worktree
pub const CACHE_DIR_ENV: &str = "CPLANE_CACHE_DIR";

/// Log filter directive, takes precedence over `RUST_LOG`
pub const LOG_ENV: &str = "CPLANE_LOG";

/// Runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub cache_dir: Option<PathBuf>,
    pub log_filter: Option<String>,
}

impl Config {
    /// Read configuration from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`
    ///
    /// Values are trimmed; a blank value counts as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| non_blank(lookup(name));
        Self {
            cache_dir: read(CACHE_DIR_ENV).map(PathBuf::from),
            log_filter: read(LOG_ENV),
        }
    }

    /// Store configuration carrying the cache root override
    #[must_use]
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            root_override: self.cache_dir.clone(),
        }
    }
}

/// Trim `value`; blank counts as unset
#[must_use]
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
