//! The artifact store: lookup, store, invalidate, stats
//!
//! Entries live at `root/<namespace>/<shard>/<id>.json`. There is no index
//! and no in-memory layer; the directory tree is the only state. Expiry is
//! lazy: lookup deletes an expired entry it trips over, stats only counts.

use crate::canonical::KeyExtra;
use crate::entry::CacheEntry;
use crate::error::{StoreError, StoreResult};
use crate::fs;
use crate::id::CacheId;
use crate::namespace::Namespace;
use crate::root::{ExecContext, StoreConfig};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Largest artifact accepted by default, in UTF-8 bytes (256 KiB)
pub const DEFAULT_MAX_BYTES: u64 = 256 * 1024;

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Optional parameters of [`ArtifactStore::store`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreOptions {
    /// Time until expiry; `None` or not positive never expires
    pub ttl: Option<Duration>,
    /// Size limit, defaults to [`DEFAULT_MAX_BYTES`]
    pub max_bytes: Option<u64>,
    /// Caller data kept alongside the artifact
    pub metadata: Option<Value>,
}

/// Result of a lookup
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    /// No entry for this key
    Miss,
    /// An entry existed but had expired; it has been removed
    Expired,
    /// Live entry
    Hit(Box<CacheEntry>),
}

impl LookupOutcome {
    /// Whether this is a cache hit
    #[inline]
    #[must_use]
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }

    /// The entry, if hit
    #[must_use]
    pub fn entry(&self) -> Option<&CacheEntry> {
        match self {
            Self::Hit(entry) => Some(&**entry),
            Self::Miss | Self::Expired => None,
        }
    }
}

/// Details of a successful write
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreReceipt {
    pub namespace: Namespace,
    pub cache_id: CacheId,
    pub path: PathBuf,
    pub bytes: u64,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Result of a store call
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOutcome {
    /// Entry written
    Stored(StoreReceipt),
    /// Artifact exceeded the size limit; nothing was written
    TooLarge { bytes: u64, max_bytes: u64 },
}

/// Result of an invalidation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidateReport {
    pub namespace: Namespace,
    pub deleted: u64,
}

/// Namespace usage summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsReport {
    pub namespace: Namespace,
    pub root: PathBuf,
    pub entries: u64,
    pub total_bytes: u64,
    pub expired_entries: u64,
}

/// Filesystem-backed, namespaced artifact cache
///
/// Safe to share between threads and processes: the atomic rename of each
/// entry file is the only synchronization, so the last writer for a key wins
/// and readers never see partial entries.
#[derive(Clone)]
pub struct ArtifactStore {
    config: StoreConfig,
    ctx: ExecContext,
    clock: Clock,
}

impl fmt::Debug for ArtifactStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactStore")
            .field("config", &self.config)
            .field("ctx", &self.ctx)
            .finish_non_exhaustive()
    }
}

impl ArtifactStore {
    /// Create a store for `ctx`
    #[must_use]
    pub fn new(config: StoreConfig, ctx: ExecContext) -> Self {
        Self {
            config,
            ctx,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the wall clock used for timestamps and expiry checks
    #[must_use]
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Resolved cache root
    ///
    /// # Errors
    /// See [`StoreConfig::resolve_root`].
    pub fn root(&self) -> StoreResult<PathBuf> {
        self.config.resolve_root(&self.ctx)
    }

    /// Path of the entry file for `id`
    ///
    /// # Errors
    /// See [`StoreConfig::resolve_root`].
    pub fn entry_path(&self, namespace: &Namespace, id: &CacheId) -> StoreResult<PathBuf> {
        Ok(entry_path_in(&self.root()?, namespace, id))
    }

    /// Look up `key`
    ///
    /// An expired entry is deleted on the way out; failure to delete it is
    /// logged and otherwise ignored.
    ///
    /// # Errors
    /// [`StoreError::MissingKey`] for an empty key, root resolution errors,
    /// and I/O or decode errors other than "not found".
    pub fn lookup(
        &self,
        namespace: &Namespace,
        key: &str,
        extra: &KeyExtra,
    ) -> StoreResult<LookupOutcome> {
        require_key(key)?;
        let id = CacheId::derive(namespace, key, extra);
        let path = self.entry_path(namespace, &id)?;

        let Some(entry) = fs::read_json::<CacheEntry>(&path)? else {
            tracing::debug!(%namespace, cache_id = %id, "cache miss");
            return Ok(LookupOutcome::Miss);
        };

        if entry.is_expired(self.now()) {
            if let Err(e) = fs::remove_file(&path) {
                tracing::warn!(path = %path.display(), "failed to delete expired entry: {e}");
            }
            tracing::debug!(%namespace, cache_id = %id, "cache entry expired");
            return Ok(LookupOutcome::Expired);
        }

        tracing::debug!(%namespace, cache_id = %id, "cache hit");
        Ok(LookupOutcome::Hit(Box::new(entry)))
    }

    /// Store `artifact` under `key`
    ///
    /// # Errors
    /// [`StoreError::MissingKey`] for an empty key, root resolution errors,
    /// and I/O errors. An oversized artifact is [`StoreOutcome::TooLarge`],
    /// not an error.
    pub fn store(
        &self,
        namespace: &Namespace,
        key: &str,
        extra: &KeyExtra,
        artifact: String,
        options: StoreOptions,
    ) -> StoreResult<StoreOutcome> {
        require_key(key)?;

        let max_bytes = options.max_bytes.unwrap_or(DEFAULT_MAX_BYTES);
        let bytes = artifact.len() as u64;
        if bytes > max_bytes {
            tracing::debug!(%namespace, bytes, max_bytes, "artifact rejected: too large");
            return Ok(StoreOutcome::TooLarge { bytes, max_bytes });
        }

        let id = CacheId::derive(namespace, key, extra);
        let path = self.entry_path(namespace, &id)?;
        let entry = CacheEntry::new(
            namespace.clone(),
            id,
            key,
            artifact,
            options.ttl,
            options.metadata,
            self.now(),
        );
        fs::atomic_write_json(&path, &entry)?;

        tracing::debug!(%namespace, cache_id = %id, bytes, "artifact stored");
        Ok(StoreOutcome::Stored(StoreReceipt {
            namespace: namespace.clone(),
            cache_id: id,
            path,
            bytes,
            expires_at: entry.expires_at,
        }))
    }

    /// Delete every entry in `namespace` whose id starts with `prefix`
    ///
    /// `None` or an empty prefix deletes the whole namespace. Entries that
    /// disappear during the scan are skipped.
    ///
    /// # Errors
    /// Root resolution errors and I/O errors other than "not found".
    /// Unreadable entries are deleted like any other.
    pub fn invalidate(
        &self,
        namespace: &Namespace,
        prefix: Option<&str>,
    ) -> StoreResult<InvalidateReport> {
        let prefix = prefix.unwrap_or_default();
        let dir = self.root()?.join(namespace.as_str());

        let mut deleted = 0;
        for file in fs::list_entry_files(&dir)? {
            // the file name is `<id>.json`; entries are never parsed here
            let matches = file
                .file_stem()
                .and_then(OsStr::to_str)
                .is_some_and(|id| id.starts_with(prefix));
            if matches && fs::remove_file(&file)? {
                deleted += 1;
            }
        }

        tracing::debug!(%namespace, prefix, deleted, "invalidated entries");
        Ok(InvalidateReport {
            namespace: namespace.clone(),
            deleted,
        })
    }

    /// Count entries, their on-disk size, and how many have expired
    ///
    /// Read-only: expired entries are counted, not removed.
    ///
    /// # Errors
    /// Root resolution errors, I/O errors other than "not found", and
    /// unreadable entries.
    pub fn stats(&self, namespace: &Namespace) -> StoreResult<StatsReport> {
        let root = self.root()?;
        let dir = root.join(namespace.as_str());
        let now = self.now();

        let mut report = StatsReport {
            namespace: namespace.clone(),
            root,
            entries: 0,
            total_bytes: 0,
            expired_entries: 0,
        };
        for file in fs::list_entry_files(&dir)? {
            let Some(size) = fs::file_size(&file)? else {
                continue;
            };
            report.entries += 1;
            report.total_bytes += size;

            if fs::read_json::<CacheEntry>(&file)?.is_some_and(|e| e.is_expired(now)) {
                report.expired_entries += 1;
            }
        }
        Ok(report)
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }
}

fn entry_path_in(root: &Path, namespace: &Namespace, id: &CacheId) -> PathBuf {
    root.join(namespace.as_str())
        .join(id.shard())
        .join(format!("{id}.json"))
}

fn require_key(key: &str) -> StoreResult<()> {
    if key.is_empty() {
        return Err(StoreError::MissingKey);
    }
    Ok(())
}
