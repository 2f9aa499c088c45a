//! Persisted cache entries

use crate::id::CacheId;
use crate::namespace::Namespace;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum length of [`CacheEntry::key_preview`], in characters
pub const KEY_PREVIEW_LEN: usize = 200;

/// One cached artifact, stored as a single JSON file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub namespace: Namespace,
    pub cache_id: CacheId,
    pub key_hash: CacheId,
    /// Truncated key for diagnostics; never used for lookup
    pub key_preview: String,
    pub created_at: DateTime<Utc>,
    /// `None` means the entry lives until invalidated
    pub expires_at: Option<DateTime<Utc>>,
    pub artifact: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl CacheEntry {
    /// Build an entry created at `now`
    ///
    /// A `ttl` of `None` or not positive yields an immortal entry.
    #[must_use]
    pub fn new(
        namespace: Namespace,
        id: CacheId,
        key: &str,
        artifact: String,
        ttl: Option<Duration>,
        metadata: Option<Value>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            namespace,
            cache_id: id,
            key_hash: id,
            key_preview: key.chars().take(KEY_PREVIEW_LEN).collect(),
            created_at: now,
            expires_at: expiry(ttl, now),
            artifact,
            metadata,
        }
    }

    /// Whether the entry's deadline has passed at `now`
    #[inline]
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|deadline| now > deadline)
    }
}

/// Deadline for a TTL, or `None` for no expiry
///
/// A TTL too large to represent is treated as no expiry.
#[must_use]
pub fn expiry(ttl: Option<Duration>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    ttl.filter(|ttl| *ttl > Duration::zero())
        .and_then(|ttl| now.checked_add_signed(ttl))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::KeyExtra;
    use pretty_assertions::assert_eq;

    fn entry(ttl: Option<Duration>, now: DateTime<Utc>) -> CacheEntry {
        let ns = Namespace::default();
        let id = CacheId::derive(&ns, "key", &KeyExtra::none());
        CacheEntry::new(ns, id, "key", "artifact".into(), ttl, None, now)
    }

    #[test]
    fn ttl_zero_or_negative_never_expires() {
        let now = Utc::now();
        assert_eq!(entry(None, now).expires_at, None);
        assert_eq!(entry(Some(Duration::zero()), now).expires_at, None);
        assert_eq!(entry(Some(Duration::seconds(-5)), now).expires_at, None);
        assert!(!entry(None, now).is_expired(now + Duration::days(3650)));
    }

    #[test]
    fn expires_strictly_after_deadline() {
        let now = Utc::now();
        let e = entry(Some(Duration::seconds(10)), now);
        let deadline = now + Duration::seconds(10);
        assert_eq!(e.expires_at, Some(deadline));
        assert!(!e.is_expired(deadline));
        assert!(e.is_expired(deadline + Duration::milliseconds(1)));
    }

    #[test]
    fn absurd_ttl_is_immortal() {
        assert_eq!(expiry(Some(Duration::MAX), Utc::now()), None);
    }

    #[test]
    fn sub_second_ttl_is_kept() {
        let now = Utc::now();
        let e = entry(Some(Duration::milliseconds(1_500)), now);
        assert_eq!(e.expires_at, Some(now + Duration::milliseconds(1_500)));
    }

    #[test]
    fn key_preview_is_truncated_by_chars() {
        let ns = Namespace::default();
        let key = "é".repeat(500);
        let id = CacheId::derive(&ns, &key, &KeyExtra::none());
        let e = CacheEntry::new(ns, id, &key, String::new(), None, None, Utc::now());
        assert_eq!(e.key_preview.chars().count(), KEY_PREVIEW_LEN);
    }

    #[test]
    fn json_shape() {
        let e = entry(None, Utc::now());
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v["namespace"], "default");
        assert_eq!(v["cache_id"], v["key_hash"]);
        assert!(v["expires_at"].is_null());
        assert!(v.get("metadata").is_none());
        let back: CacheEntry = serde_json::from_value(v).unwrap();
        assert_eq!(back, e);
    }

    #[test]
    fn reads_millisecond_iso_timestamps() {
        let id = CacheId::new([1; 32]);
        let text = format!(
            r#"{{"namespace":"default","cache_id":"{id}","key_hash":"{id}","key_preview":"k",
            "created_at":"2024-05-01T10:00:00.000Z","expires_at":"2024-05-01T10:00:01.000Z",
            "artifact":"a","metadata":{{"tool":"scan"}}}}"#
        );
        let e: CacheEntry = serde_json::from_str(&text).unwrap();
        assert!(e.is_expired(Utc::now()));
        assert_eq!(e.metadata.unwrap()["tool"], "scan");
    }
}
