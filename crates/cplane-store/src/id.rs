//! Content-addressed cache identifiers
//!
//! Provides [`CacheId`], a strongly-typed 32-byte SHA-256 digest used both as
//! the identity of a cache entry and as its storage address.

use crate::canonical::KeyExtra;
use crate::namespace::Namespace;
use sha2::{Digest, Sha256};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// A 32-byte cache identifier (SHA-256)
///
/// Computed over `(namespace, key, canonical extra)`, so the same logical key
/// always maps to the same id on every machine. Cheap to clone (Copy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CacheId([u8; 32]);

impl CacheId {
    /// Create a new id from raw digest bytes
    #[inline]
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get reference to the underlying bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Create id from byte slice
    ///
    /// # Errors
    /// Returns error if slice length is not exactly 32 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, IdError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| IdError::InvalidLength {
            expected: 32,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    /// Derive the id for a logical key within a namespace
    ///
    /// The digest input is `"{namespace}\n{key}\n{canonical extra}"`.
    #[must_use]
    pub fn derive(namespace: &Namespace, key: &str, extra: &KeyExtra) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(namespace.as_str().as_bytes());
        hasher.update(b"\n");
        hasher.update(key.as_bytes());
        hasher.update(b"\n");
        hasher.update(extra.canonical().as_bytes());
        Self(hasher.finalize().into())
    }

    /// Two-character shard directory name (first byte, hex)
    #[inline]
    #[must_use]
    pub fn shard(&self) -> String {
        hex::encode(&self.0[..1])
    }
}

impl Display for CacheId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for CacheId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
    }
}

impl AsRef<[u8; 32]> for CacheId {
    fn as_ref(&self) -> &[u8; 32] {
        &self.0
    }
}

// Persisted entries carry ids as hex strings
impl serde::Serialize for CacheId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for CacheId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct CacheIdVisitor;

        impl<'de> serde::de::Visitor<'de> for CacheIdVisitor {
            type Value = CacheId;

            fn expecting(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
                formatter.write_str("a 64-character hex digest")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                value.parse().map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_str(CacheIdVisitor)
    }
}

/// Errors that can occur when parsing cache ids
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    /// Invalid digest length
    #[error("invalid cache id length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Hex encoding error
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),
}
