//! Error types for the artifact store
//!
//! Oversized artifacts are not errors: they come back as
//! [`StoreOutcome::TooLarge`](crate::StoreOutcome::TooLarge) so callers can
//! branch on them. Everything here aborts the call.

use std::path::PathBuf;

/// Errors during store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Lookup or store called without a key
    #[error("Missing key")]
    MissingKey,

    /// Store called without a string artifact
    #[error("Missing artifact (string)")]
    MissingArtifact,

    /// A relative cache root override resolved outside the worktree
    #[error("Invalid cache root (escapes worktree): {root} is not inside {worktree}")]
    RootEscapesWorktree { root: PathBuf, worktree: PathBuf },

    /// Current directory unavailable while resolving a relative worktree
    #[error("cannot resolve working directory: {0}")]
    Workdir(#[source] std::io::Error),

    /// Filesystem error other than "not found"
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Persisted entry is not valid JSON
    #[error("corrupt cache entry {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Entry could not be encoded
    #[error("failed to encode cache entry: {0}")]
    Encode(#[source] serde_json::Error),
}

impl StoreError {
    /// Create IO error for path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if the caller violated the operation contract
    #[inline]
    #[must_use]
    pub fn is_contract_error(&self) -> bool {
        matches!(self, Self::MissingKey | Self::MissingArtifact)
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
