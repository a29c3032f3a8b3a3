//! Cache tiers for discovered routes.
//!
//! Two [`CacheStore`] implementations back the route cache:
//!
//! - [`LocalCache`] - in-process, per registry
//! - [`FileCache`] - shared across processes through a directory of JSON files
//!
//! [`NullCache`] stands in for a disabled tier.

mod entry;
mod file;
mod local;

pub(crate) use entry::modified_nanos;
pub use entry::{CacheInvalidation, RouteCacheEntry};
pub use file::FileCache;
pub use local::LocalCache;

use crate::error::CacheError;
use std::time::Duration;

/// A string key-value store with per-entry expiry.
pub trait CacheStore: Send + Sync + 'static {
    /// Short tier name used in logs.
    fn name(&self) -> &'static str;

    /// Returns the live value for `key`.
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Stores `value` under `key` for `ttl`.
    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Removes `key`. Removing a missing key succeeds.
    fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// A tier that stores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCache;

impl CacheStore for NullCache {
    fn name(&self) -> &'static str {
        "null"
    }

    fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
        Ok(())
    }

    fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Ok(())
    }
}

impl std::fmt::Debug for dyn CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CacheStore({})", self.name())
    }
}
