//! Filesystem primitives: atomic JSON writes, tolerant reads, entry scans
//!
//! "Not found" is absence everywhere in this module; every other I/O error is
//! returned to the caller.

use crate::error::{StoreError, StoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Write `value` as pretty JSON to `dest` via temp file + rename
///
/// The temp file lives next to `dest`, is named `.tmp-<pid>-<random>.json`
/// and is created owner-only. A concurrent reader sees either the old file or
/// the new one, never a partial write. If the process dies before the rename,
/// `dest` is untouched.
pub(crate) fn atomic_write_json<T: Serialize>(dest: &Path, value: &T) -> StoreResult<()> {
    let dir = dest
        .parent()
        .ok_or_else(|| StoreError::io(dest, std::io::Error::from(ErrorKind::InvalidInput)))?;
    std::fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

    let body = serde_json::to_vec_pretty(value).map_err(StoreError::Encode)?;

    let prefix = format!(".tmp-{}-", std::process::id());
    let mut builder = tempfile::Builder::new();
    builder.prefix(&prefix).suffix(".json").rand_bytes(12);
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o600));
    }
    let mut tmp = builder.tempfile_in(dir).map_err(|e| StoreError::io(dir, e))?;

    tmp.write_all(&body).map_err(|e| StoreError::io(tmp.path(), e))?;
    tmp.as_file().sync_all().map_err(|e| StoreError::io(tmp.path(), e))?;
    tmp.persist(dest).map_err(|e| StoreError::io(dest, e.error))?;
    Ok(())
}

/// Read and decode a JSON file; `Ok(None)` if it does not exist
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> StoreResult<Option<T>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::io(path, e)),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| StoreError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
}

/// Delete a file; `Ok(false)` if it was already gone
pub(crate) fn remove_file(path: &Path) -> StoreResult<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

/// On-disk size of a file; `Ok(None)` if it vanished
pub(crate) fn file_size(path: &Path) -> StoreResult<Option<u64>> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(Some(meta.len())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

/// Recursively list entry files (`*.json`, not dot-prefixed) under `dir`
///
/// A missing `dir` yields an empty list. Output is sorted for stable scans.
pub(crate) fn list_entry_files(dir: &Path) -> StoreResult<Vec<PathBuf>> {
    let mut out = Vec::new();
    walk(dir, &mut out)?;
    out.sort();
    Ok(out)
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> StoreResult<()> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(StoreError::io(dir, e)),
    };

    for entry in entries {
        let entry = entry.map_err(|e| StoreError::io(dir, e))?;
        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(t) => t,
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => return Err(StoreError::io(&path, e)),
        };

        if file_type.is_dir() {
            walk(&path, out)?;
        } else if file_type.is_file() && is_entry_name(&entry.file_name().to_string_lossy()) {
            out.push(path);
        }
    }
    Ok(())
}

fn is_entry_name(name: &str) -> bool {
    name.ends_with(".json") && !name.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn atomic_write_creates_parents_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("ns/ab/abc.json");
        atomic_write_json(&dest, &json!({"a": 1})).unwrap();

        let back: Option<Value> = read_json(&dest).unwrap();
        assert_eq!(back, Some(json!({"a": 1})));

        let siblings: Vec<_> = std::fs::read_dir(dest.parent().unwrap()).unwrap().collect();
        assert_eq!(siblings.len(), 1);
    }

    #[test]
    fn atomic_write_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("x.json");
        atomic_write_json(&dest, &json!("old")).unwrap();
        atomic_write_json(&dest, &json!("new")).unwrap();
        assert_eq!(read_json::<Value>(&dest).unwrap(), Some(json!("new")));
    }

    #[cfg(unix)]
    #[test]
    fn entries_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("x.json");
        atomic_write_json(&dest, &json!(null)).unwrap();
        let mode = std::fs::metadata(&dest).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn missing_files_are_absent_not_errors() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("gone.json");
        assert_eq!(read_json::<Value>(&gone).unwrap(), None);
        assert!(!remove_file(&gone).unwrap());
        assert_eq!(file_size(&gone).unwrap(), None);
        assert!(list_entry_files(&dir.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn corrupt_json_is_reported_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{not json").unwrap();
        let err = read_json::<Value>(&bad).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { ref path, .. } if *path == bad));
    }

    #[test]
    fn listing_skips_temp_and_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let shard = dir.path().join("ab");
        std::fs::create_dir_all(&shard).unwrap();
        std::fs::write(shard.join("abc.json"), "{}").unwrap();
        std::fs::write(shard.join(".tmp-1-xyz.json"), "{").unwrap();
        std::fs::write(shard.join("notes.txt"), "").unwrap();

        let files = list_entry_files(dir.path()).unwrap();
        assert_eq!(files, vec![shard.join("abc.json")]);
    }
}
