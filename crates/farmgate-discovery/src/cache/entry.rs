//! Persisted route snapshot and its validity check.

use crate::definition::RouteDefinition;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use thiserror::Error;

/// Routes plus the controller files they were discovered from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteCacheEntry {
    /// Discovered routes in registration order.
    pub routes: Vec<RouteDefinition>,
    /// Controller identifier to modification time (nanoseconds since the Unix epoch).
    pub file_mod_times: IndexMap<String, u64>,
    /// Controller identifier to source path.
    pub file_paths: IndexMap<String, PathBuf>,
    /// When the snapshot was written.
    pub cached_at: DateTime<Utc>,
}

/// Why a snapshot was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheInvalidation {
    /// The snapshot holds no routes.
    #[error("cached entry has no routes")]
    NoRoutes,

    /// A different number of controllers is registered now.
    #[error("controller count changed from {cached} to {registered}")]
    ControllerCountChanged {
        /// Controllers tracked by the snapshot.
        cached: usize,
        /// Controllers registered now.
        registered: usize,
    },

    /// A tracked source file is gone.
    #[error("source file of '{controller}' is missing: {}", path.display())]
    FileMissing {
        /// Controller identifier.
        controller: String,
        /// Tracked path.
        path: PathBuf,
    },

    /// A tracked source file was modified.
    #[error("source file of '{controller}' changed")]
    FileModified {
        /// Controller identifier.
        controller: String,
        /// Recorded modification time.
        cached: u64,
        /// Current modification time.
        current: u64,
    },
}

impl CacheInvalidation {
    /// Short reason label for logs and metrics.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NoRoutes => "no_routes",
            Self::ControllerCountChanged { .. } => "controller_count_changed",
            Self::FileMissing { .. } => "file_missing",
            Self::FileModified { .. } => "file_modified",
        }
    }
}

impl RouteCacheEntry {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn new(
        routes: Vec<RouteDefinition>,
        file_mod_times: IndexMap<String, u64>,
        file_paths: IndexMap<String, PathBuf>,
    ) -> Self {
        Self {
            routes,
            file_mod_times,
            file_paths,
            cached_at: Utc::now(),
        }
    }

    /// Checks the snapshot against the filesystem and the number of
    /// currently registered controllers.
    pub fn validate(&self, registered: usize) -> Result<(), CacheInvalidation> {
        if self.routes.is_empty() {
            return Err(CacheInvalidation::NoRoutes);
        }

        if self.file_mod_times.len() != registered {
            return Err(CacheInvalidation::ControllerCountChanged {
                cached: self.file_mod_times.len(),
                registered,
            });
        }

        for (controller, &cached) in &self.file_mod_times {
            let Some(path) = self.file_paths.get(controller) else {
                return Err(CacheInvalidation::FileMissing {
                    controller: controller.clone(),
                    path: PathBuf::new(),
                });
            };
            match modified_nanos(path) {
                Ok(current) if current == cached => {}
                Ok(current) => {
                    return Err(CacheInvalidation::FileModified {
                        controller: controller.clone(),
                        cached,
                        current,
                    })
                }
                Err(_) => {
                    return Err(CacheInvalidation::FileMissing {
                        controller: controller.clone(),
                        path: path.clone(),
                    })
                }
            }
        }

        Ok(())
    }
}

/// Modification time of `path` in nanoseconds since the Unix epoch.
pub(crate) fn modified_nanos(path: &Path) -> std::io::Result<u64> {
    let modified = std::fs::metadata(path)?.modified()?;
    let nanos = modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    Ok(nanos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::HandlerRef;
    use farmgate_core::HttpMethod;
    use std::fs::File;
    use std::time::{Duration, SystemTime};

    fn route() -> RouteDefinition {
        RouteDefinition {
            method: HttpMethod::Get,
            path: "/users".to_string(),
            handler: HandlerRef {
                controller: "users".to_string(),
                action: "index".to_string(),
            },
            middleware: Vec::new(),
            is_public: false,
            input: crate::ActionInput::Request,
            description: None,
        }
    }

    fn tracked(path: &Path) -> RouteCacheEntry {
        let mtime = modified_nanos(path).unwrap();
        RouteCacheEntry::new(
            vec![route()],
            [("users".to_string(), mtime)].into_iter().collect(),
            [("users".to_string(), path.to_path_buf())].into_iter().collect(),
        )
    }

    #[test]
    fn test_fresh_entry_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users_controller.rs");
        std::fs::write(&path, "// users").unwrap();
        assert_eq!(tracked(&path).validate(1), Ok(()));
    }

    #[test]
    fn test_invalidation_reasons() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users_controller.rs");
        std::fs::write(&path, "// users").unwrap();
        let entry = tracked(&path);

        let mut empty = entry.clone();
        empty.routes.clear();
        assert_eq!(empty.validate(1), Err(CacheInvalidation::NoRoutes));

        assert_eq!(
            entry.validate(2),
            Err(CacheInvalidation::ControllerCountChanged {
                cached: 1,
                registered: 2
            })
        );

        let later = SystemTime::now() + Duration::from_secs(30);
        File::options().write(true).open(&path).unwrap().set_modified(later).unwrap();
        assert_eq!(entry.validate(1).unwrap_err().reason(), "file_modified");

        std::fs::remove_file(&path).unwrap();
        assert_eq!(entry.validate(1).unwrap_err().reason(), "file_missing");
    }

    #[test]
    fn test_entry_json_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users_controller.rs");
        std::fs::write(&path, "").unwrap();

        let value = serde_json::to_value(tracked(&path)).unwrap();
        for key in ["routes", "file_mod_times", "file_paths", "cached_at"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        let back: RouteCacheEntry = serde_json::from_value(value).unwrap();
        assert_eq!(back.routes, vec![route()]);
    }
}
