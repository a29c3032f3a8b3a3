//! Shared cache tier backed by a directory of JSON files.
//!
//! Each key maps to `<sha256(key)>.json` holding `{"expires_at", "value"}`,
//! where `expires_at` is a Unix timestamp in seconds. Writes go to a
//! temporary file first and are renamed into place.

use super::CacheStore;
use crate::error::CacheError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Serialize, Deserialize)]
struct StoredValue {
    expires_at: u64,
    value: String,
}

/// Directory-backed tier shared by every process pointing at the same directory.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Opens (and creates if needed) a cache in `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| CacheError::io(&dir, e))?;
        Ok(Self { dir })
    }

    /// Returns the cache directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.dir.join(format!("{}.json", hex::encode(digest)))
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl CacheStore for FileCache {
    fn name(&self) -> &'static str {
        "shared"
    }

    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let path = self.path_for(key);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::io(path, e)),
        };

        let stored: StoredValue = serde_json::from_str(&raw)?;
        if stored.expires_at <= now_secs() {
            tracing::debug!(key, "shared cache entry expired");
            self.delete(key)?;
            return Ok(None);
        }
        Ok(Some(stored.value))
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let path = self.path_for(key);
        let stored = StoredValue {
            expires_at: now_secs().saturating_add(ttl.as_secs()),
            value: value.to_string(),
        };
        let encoded = serde_json::to_vec(&stored)?;

        let tmp = path.with_extension(format!("json.{}.tmp", std::process::id()));
        fs::write(&tmp, encoded).map_err(|e| CacheError::io(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| CacheError::io(&path, e))
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::io(path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::open(dir.path().join("routes")).unwrap();

        cache.set("farmgate:routes", "{\"x\":1}", Duration::from_secs(60)).unwrap();
        assert_eq!(cache.get("farmgate:routes").unwrap().as_deref(), Some("{\"x\":1}"));

        // a second handle on the same directory sees the value
        let other = FileCache::open(cache.dir()).unwrap();
        assert!(other.get("farmgate:routes").unwrap().is_some());

        cache.delete("farmgate:routes").unwrap();
        assert_eq!(other.get("farmgate:routes").unwrap(), None);
    }

    #[test]
    fn test_zero_ttl_expires_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::open(dir.path()).unwrap();
        cache.set("k", "v", Duration::ZERO).unwrap();
        assert_eq!(cache.get("k").unwrap(), None);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::open(dir.path()).unwrap();
        fs::write(cache.path_for("k"), "not json").unwrap();
        assert!(matches!(cache.get("k"), Err(CacheError::Serialization(_))));
    }

    #[test]
    fn test_keys_map_to_hashed_names() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::open(dir.path()).unwrap();
        let name = cache.path_for("a/b:c").file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(name.len(), 64 + ".json".len());
        assert!(name.bytes().take(64).all(|b| b.is_ascii_hexdigit()));
    }
}
