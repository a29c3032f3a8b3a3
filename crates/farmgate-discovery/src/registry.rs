//! The controller registry: discovery, the two-tier route cache and router binding.
//!
//! Discovery consults the tiers in order:
//!
//! 1. the local tier, when its snapshot is still valid
//! 2. the shared tier, back-filling the local tier on success
//! 3. a full pass over the registered controllers, written to both tiers
//!
//! A snapshot is valid while every tracked source file keeps its recorded
//! modification time and the number of registered controllers is unchanged.

use crate::cache::{
    modified_nanos, CacheInvalidation, CacheStore, LocalCache, NullCache, RouteCacheEntry,
};
use crate::catalog::ControllerCatalog;
use crate::controller::Controller;
use crate::definition::RouteDefinition;
use crate::error::DiscoveryError;
use crate::handler::ActionHandler;
use crate::inventory::RouteInventory;
use crate::scan::{scan_directory, scan_key};
use farmgate_core::BoxedHandler;
use farmgate_router::RouteTableBuilder;
use farmgate_versioning::strip_version_prefix;
use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Default key of the route snapshot.
pub const DEFAULT_CACHE_KEY: &str = "farmgate:routes";

/// Cache keys and lifetimes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverySettings {
    /// Key of the route snapshot in both tiers.
    pub cache_key: String,
    /// Lifetime of the route snapshot.
    pub cache_ttl: Duration,
    /// Lifetime of a cached directory scan.
    pub scan_ttl: Duration,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            cache_key: DEFAULT_CACHE_KEY.to_string(),
            cache_ttl: Duration::from_secs(86_400),
            scan_ttl: Duration::from_secs(3_600),
        }
    }
}

/// A cache tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTier {
    /// In-process tier.
    Local,
    /// Shared tier.
    Shared,
}

impl CacheTier {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Shared => "shared",
        }
    }
}

impl fmt::Display for CacheTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a discovery result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryOutcome {
    /// A valid snapshot was found in a tier.
    Cached(CacheTier),
    /// Controllers were introspected from scratch.
    Discovered,
}

/// Routes plus their origin.
#[derive(Debug, Clone)]
pub struct Discovery {
    /// Discovered routes in registration order.
    pub routes: Vec<RouteDefinition>,
    /// Where they came from.
    pub outcome: DiscoveryOutcome,
}

/// Discovers controller routes and binds them to a router.
pub struct ControllerRegistry {
    catalog: Arc<ControllerCatalog>,
    settings: DiscoverySettings,
    local: Option<Arc<dyn CacheStore>>,
    shared: Arc<dyn CacheStore>,
    registered: IndexSet<String>,
    instances: RwLock<HashMap<String, Arc<dyn Controller>>>,
}

impl ControllerRegistry {
    /// Creates a registry with a local tier and no shared tier.
    #[must_use]
    pub fn new(catalog: Arc<ControllerCatalog>) -> Self {
        Self {
            catalog,
            settings: DiscoverySettings::default(),
            local: Some(Arc::new(LocalCache::new())),
            shared: Arc::new(NullCache),
            registered: IndexSet::new(),
            instances: RwLock::new(HashMap::new()),
        }
    }

    /// Replaces the cache settings.
    #[must_use]
    pub fn with_settings(mut self, settings: DiscoverySettings) -> Self {
        self.settings = settings;
        self
    }

    /// Replaces the local tier; `None` disables it.
    #[must_use]
    pub fn with_local_cache(mut self, local: Option<Arc<dyn CacheStore>>) -> Self {
        self.local = local;
        self
    }

    /// Replaces the shared tier.
    #[must_use]
    pub fn with_shared_cache(mut self, shared: Arc<dyn CacheStore>) -> Self {
        self.shared = shared;
        self
    }

    /// Returns the settings.
    #[must_use]
    pub fn settings(&self) -> &DiscoverySettings {
        &self.settings
    }

    /// Returns the catalog.
    #[must_use]
    pub fn catalog(&self) -> &Arc<ControllerCatalog> {
        &self.catalog
    }

    /// Adds a controller to the discovery set.
    ///
    /// Returns `false` (and logs) when the catalog cannot resolve `id`.
    /// Registering twice is a no-op.
    pub fn register(&mut self, id: &str) -> bool {
        if !self.catalog.contains(id) {
            tracing::warn!(controller = id, "ignoring unresolvable controller");
            return false;
        }
        if self.registered.insert(id.to_string()) {
            tracing::debug!(controller = id, "registered controller");
        }
        true
    }

    /// Returns the discovery set in registration order.
    #[must_use]
    pub fn registered(&self) -> Vec<&str> {
        self.registered.iter().map(String::as_str).collect()
    }

    /// Discovers routes, returning only the routes.
    pub fn discover_routes(&self) -> Vec<RouteDefinition> {
        self.discover().routes
    }

    /// Lists discovered routes and the registered controllers that declare none.
    pub fn inventory(&self) -> RouteInventory {
        let controllers_without_routes = self
            .registered
            .iter()
            .filter(|id| {
                self.catalog
                    .get(id)
                    .is_some_and(|descriptor| descriptor.metadata().actions.is_empty())
            })
            .cloned()
            .collect();
        RouteInventory {
            routes: self.discover().routes,
            controllers_without_routes,
        }
    }

    /// Discovers routes through the cache tiers.
    pub fn discover(&self) -> Discovery {
        if let Some(local) = &self.local {
            if let Some(entry) = self.read_tier(local.as_ref(), CacheTier::Local) {
                return cached(entry, CacheTier::Local);
            }
        }

        if let Some(entry) = self.read_tier(self.shared.as_ref(), CacheTier::Shared) {
            if let Some(local) = &self.local {
                self.write_tier(local.as_ref(), &entry);
            }
            return cached(entry, CacheTier::Shared);
        }

        let entry = self.discover_all();
        if let Some(local) = &self.local {
            self.write_tier(local.as_ref(), &entry);
        }
        self.write_tier(self.shared.as_ref(), &entry);

        Discovery {
            routes: entry.routes,
            outcome: DiscoveryOutcome::Discovered,
        }
    }

    /// Checks a snapshot against the filesystem and the discovery set.
    pub fn is_cache_valid(&self, entry: &RouteCacheEntry) -> Result<(), CacheInvalidation> {
        entry.validate(self.registered.len())
    }

    /// Removes the snapshot from both tiers.
    pub fn clear_cache(&self) {
        let key = &self.settings.cache_key;
        if let Some(local) = &self.local {
            if let Err(e) = local.delete(key) {
                tracing::warn!(tier = local.name(), error = %e, "failed to clear route cache");
            }
        }
        if let Err(e) = self.shared.delete(key) {
            tracing::warn!(tier = self.shared.name(), error = %e, "failed to clear route cache");
        }
        tracing::info!(key = %key, "route cache cleared");
    }

    /// Returns the shared instance of a controller, building it on first use.
    pub fn instance(&self, id: &str) -> Result<Arc<dyn Controller>, DiscoveryError> {
        if let Some(controller) = self.instances.read().get(id) {
            return Ok(Arc::clone(controller));
        }

        let descriptor = self
            .catalog
            .get(id)
            .ok_or_else(|| DiscoveryError::UnknownController { id: id.to_string() })?;

        let mut instances = self.instances.write();
        if let Some(controller) = instances.get(id) {
            return Ok(Arc::clone(controller));
        }
        let controller = descriptor
            .construct()
            .map_err(|source| DiscoveryError::Construct {
                id: id.to_string(),
                source,
            })?;
        tracing::debug!(controller = id, "constructed controller");
        instances.insert(id.to_string(), Arc::clone(&controller));
        Ok(controller)
    }

    /// Registers discovered routes on `builder`.
    ///
    /// Version prefixes are stripped from each path. Controllers are built
    /// here, once each. Routes whose controller cannot be built or whose
    /// middleware fails to resolve are logged and skipped. Returns the number
    /// of routes registered.
    pub fn register_with_router(
        &self,
        routes: &[RouteDefinition],
        builder: &mut RouteTableBuilder,
    ) -> usize {
        let mut registered = 0;
        for def in routes {
            let controller = match self.instance(&def.handler.controller) {
                Ok(controller) => controller,
                Err(e) => {
                    tracing::error!(
                        controller = %def.handler.controller,
                        action = %def.handler.action,
                        error = %e,
                        "skipping route, controller unavailable"
                    );
                    continue;
                }
            };

            let handler: BoxedHandler = Arc::new(ActionHandler::new(
                controller,
                def.handler.action.clone(),
                def.input,
            ));
            let path = strip_version_prefix(&def.path);
            let middleware: Vec<&str> = def.middleware.iter().map(String::as_str).collect();

            match builder.add_route(def.method, &path, handler, &middleware, def.is_public) {
                Ok(()) => registered += 1,
                Err(e) => tracing::debug!(error = %e, "route not registered"),
            }
        }

        tracing::info!(
            route_count = registered,
            skipped = routes.len() - registered,
            "registered discovered routes"
        );
        registered
    }

    /// Registers every resolvable `*controller.rs` under `base`.
    ///
    /// Identifiers are `namespace::relative::dirs::stem`. The identifier list
    /// is cached in the shared tier for [`DiscoverySettings::scan_ttl`].
    /// Returns the number of resolvable controllers found.
    pub fn discover_directory(
        &mut self,
        base: &Path,
        namespace: &str,
        recursive: bool,
    ) -> Result<usize, DiscoveryError> {
        let key = scan_key(base, namespace, recursive);

        let ids = match self.cached_scan(&key) {
            Some(ids) => ids,
            None => {
                let ids = scan_directory(base, namespace, recursive)?;
                self.store_scan(&key, &ids);
                ids
            }
        };

        let found = ids.iter().filter(|id| self.register(id)).count();
        tracing::info!(
            base = %base.display(),
            namespace,
            scanned = ids.len(),
            registered = found,
            "controller directory scanned"
        );
        Ok(found)
    }

    fn cached_scan(&self, key: &str) -> Option<Vec<String>> {
        let raw = match self.shared.get(key) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "controller scan cache unavailable");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(ids) => {
                tracing::debug!(key, "controller scan cache hit");
                Some(ids)
            }
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable controller scan");
                None
            }
        }
    }

    fn store_scan(&self, key: &str, ids: &[String]) {
        let result = serde_json::to_string(ids)
            .map_err(Into::into)
            .and_then(|raw| self.shared.set(key, &raw, self.settings.scan_ttl));
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to cache controller scan");
        }
    }

    fn read_tier(&self, store: &dyn CacheStore, tier: CacheTier) -> Option<RouteCacheEntry> {
        let raw = match store.get(&self.settings.cache_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                record(tier, "miss");
                tracing::debug!(tier = %tier, "route cache miss");
                return None;
            }
            Err(e) => {
                record(tier, "error");
                tracing::warn!(tier = %tier, error = %e, "route cache unavailable");
                return None;
            }
        };

        let entry: RouteCacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                record(tier, "invalid");
                tracing::warn!(tier = %tier, error = %e, "discarding unreadable route cache");
                return None;
            }
        };

        match self.is_cache_valid(&entry) {
            Ok(()) => {
                record(tier, "hit");
                tracing::info!(
                    tier = %tier,
                    route_count = entry.routes.len(),
                    cached_at = %entry.cached_at,
                    "route cache hit"
                );
                Some(entry)
            }
            Err(reason) => {
                record(tier, "invalid");
                tracing::info!(
                    tier = %tier,
                    reason = reason.reason(),
                    detail = %reason,
                    "route cache invalidated"
                );
                None
            }
        }
    }

    fn write_tier(&self, store: &dyn CacheStore, entry: &RouteCacheEntry) {
        let result = serde_json::to_string(entry)
            .map_err(Into::into)
            .and_then(|raw| store.set(&self.settings.cache_key, &raw, self.settings.cache_ttl));
        if let Err(e) = result {
            tracing::warn!(tier = store.name(), error = %e, "failed to write route cache");
        }
    }

    fn discover_all(&self) -> RouteCacheEntry {
        let mut routes = Vec::new();
        let mut mod_times = IndexMap::new();
        let mut paths = IndexMap::new();

        for id in &self.registered {
            let Some(descriptor) = self.catalog.get(id) else {
                tracing::warn!(controller = %id, "controller vanished from catalog");
                continue;
            };

            let path = absolute(descriptor.source_path());
            match modified_nanos(&path) {
                Ok(mtime) => {
                    mod_times.insert(id.clone(), mtime);
                    paths.insert(id.clone(), path);
                }
                Err(e) => tracing::warn!(
                    controller = %id,
                    path = %path.display(),
                    error = %e,
                    "cannot read controller source modification time"
                ),
            }

            let metadata = descriptor.metadata();
            for action in &metadata.actions {
                let def = RouteDefinition::from_action(id, &metadata.group, action);
                if def.is_public {
                    tracing::info!(
                        controller = %id,
                        method = %def.method,
                        path = %def.path,
                        "discovered public route"
                    );
                } else {
                    tracing::debug!(
                        controller = %id,
                        method = %def.method,
                        path = %def.path,
                        "discovered route"
                    );
                }
                routes.push(def);
            }
        }

        tracing::info!(
            controller_count = self.registered.len(),
            route_count = routes.len(),
            "route discovery complete"
        );
        RouteCacheEntry::new(routes, mod_times, paths)
    }
}

impl fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerRegistry")
            .field("settings", &self.settings)
            .field("registered", &self.registered)
            .field("local", &self.local.as_ref().map(|c| c.name()))
            .field("shared", &self.shared.name())
            .finish_non_exhaustive()
    }
}

fn cached(entry: RouteCacheEntry, tier: CacheTier) -> Discovery {
    Discovery {
        routes: entry.routes,
        outcome: DiscoveryOutcome::Cached(tier),
    }
}

fn record(tier: CacheTier, outcome: &'static str) {
    metrics::counter!(
        "farmgate_route_cache_total",
        "tier" => tier.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
}
