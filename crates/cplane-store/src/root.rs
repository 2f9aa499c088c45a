//! Cache root resolution
//!
//! The root comes from an optional override (absolute, or relative to the
//! worktree) and falls back to [`DEFAULT_CACHE_DIR`]. A relative override must
//! stay inside the worktree.

use crate::error::{StoreError, StoreResult};
use std::path::{Component, Path, PathBuf};

/// Cache directory used when no override is configured, relative to the worktree
pub const DEFAULT_CACHE_DIR: &str = ".codex/cache/analysis-cache";

/// Execution context of a store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecContext {
    worktree: PathBuf,
}

impl ExecContext {
    /// Context rooted at `worktree`
    #[must_use]
    pub fn new(worktree: impl Into<PathBuf>) -> Self {
        Self {
            worktree: worktree.into(),
        }
    }

    /// Worktree directory
    #[inline]
    #[must_use]
    pub fn worktree(&self) -> &Path {
        &self.worktree
    }
}

/// Store configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreConfig {
    /// Alternate cache root, absolute or relative to the worktree
    pub root_override: Option<PathBuf>,
}

impl StoreConfig {
    /// Config using the default cache directory
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Config with an alternate cache root
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root_override: Some(root.into()),
        }
    }

    /// Resolve the absolute cache root for `ctx`
    ///
    /// # Errors
    /// [`StoreError::RootEscapesWorktree`] if a relative override leaves the
    /// worktree, [`StoreError::Workdir`] if a relative worktree cannot be
    /// made absolute.
    pub fn resolve_root(&self, ctx: &ExecContext) -> StoreResult<PathBuf> {
        let base = match &self.root_override {
            Some(p) if !p.as_os_str().is_empty() => p.as_path(),
            _ => Path::new(DEFAULT_CACHE_DIR),
        };

        if base.is_absolute() {
            return Ok(normalize(base));
        }

        let worktree = absolute(ctx.worktree())?;
        let root = normalize(&worktree.join(base));
        if !root.starts_with(&worktree) {
            return Err(StoreError::RootEscapesWorktree { root, worktree });
        }
        Ok(root)
    }
}

fn absolute(path: &Path) -> StoreResult<PathBuf> {
    if path.is_absolute() {
        return Ok(normalize(path));
    }
    let cwd = std::env::current_dir().map_err(StoreError::Workdir)?;
    Ok(normalize(&cwd.join(path)))
}

/// Lexically resolve `.` and `..` without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root
                let at_root = matches!(
                    out.components().next_back(),
                    Some(Component::RootDir | Component::Prefix(_)) | None
                );
                if !at_root {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
