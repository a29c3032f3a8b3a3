//! Configuration-lookup contract.

use std::collections::HashMap;

/// Looks up a configuration value by key.
pub trait ConfigLookup: Send + Sync + 'static {
    /// Returns the value for `key`, if set.
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads values from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvLookup;

impl ConfigLookup for EnvLookup {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }
}

/// Serves values from a fixed map.
#[derive(Debug, Clone, Default)]
pub struct MapLookup {
    values: HashMap<String, String>,
}

impl MapLookup {
    /// Creates an empty lookup.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl<K, V> FromIterator<(K, V)> for MapLookup
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl ConfigLookup for MapLookup {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}
