//! Namespace sanitization
//!
//! A namespace becomes a directory name under the cache root, so it is
//! restricted to `[A-Za-z0-9._-]` and at most [`MAX_NAMESPACE_LEN`] characters.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Namespace used when none is supplied or sanitization leaves nothing usable
pub const DEFAULT_NAMESPACE: &str = "default";

/// Maximum namespace length after sanitization
pub const MAX_NAMESPACE_LEN: usize = 80;

/// A sanitized cache namespace
///
/// Construction is the sanitizer: every input maps to a non-empty, safe
/// directory segment, and sanitizing an already sanitized name is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(String);

impl Namespace {
    /// Sanitize `raw` into a namespace
    #[must_use]
    pub fn new(raw: &str) -> Self {
        let cleaned: String = raw
            .chars()
            .map(|c| if is_safe(c) { c } else { '_' })
            .take(MAX_NAMESPACE_LEN)
            .collect();

        // "." and ".." would address the root or its parent
        if cleaned.chars().all(|c| c == '.') {
            return Self::default();
        }
        Self(cleaned)
    }

    /// Sanitize an optional namespace, defaulting to [`DEFAULT_NAMESPACE`]
    #[must_use]
    pub fn from_option(raw: Option<&str>) -> Self {
        raw.map_or_else(Self::default, Self::new)
    }

    /// The sanitized name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

impl Default for Namespace {
    fn default() -> Self {
        Self(DEFAULT_NAMESPACE.to_string())
    }
}

impl Display for Namespace {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Namespace {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
