//! Error types for discovery and caching.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while discovering or binding controllers.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Identifier has no descriptor in the catalog.
    #[error("unknown controller '{id}'")]
    UnknownController {
        /// The identifier.
        id: String,
    },

    /// Controller factory failed.
    #[error("failed to construct controller '{id}': {source}")]
    Construct {
        /// The identifier.
        id: String,
        /// Factory error.
        #[source]
        source: anyhow::Error,
    },

    /// Filesystem access failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by a cache tier.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Reading or writing a cache file failed.
    #[error("cache I/O error at {}: {source}", path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A cached value could not be encoded or decoded.
    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
