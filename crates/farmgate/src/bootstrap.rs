//! Wiring a [`Dispatcher`] from configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use farmgate_config::{ConfigError, FarmgateConfig};
use farmgate_core::{ConfigLookup, EnvLookup};
use farmgate_discovery::{
    CacheStore, ControllerCatalog, ControllerRegistry, DiscoveryOutcome, DiscoverySettings,
    FileCache, LocalCache, NullCache,
};
use farmgate_extract::BodyDecoder;
use farmgate_middleware::{BoxedMiddleware, MiddlewareRegistry};
use farmgate_router::{Dispatcher, RouteError, RouteTable, RouteTableBuilder};
use farmgate_versioning::{VersionError, VersionResolver};
use thiserror::Error;

/// Errors raised while assembling an [`Application`].
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Version list could not be turned into a resolver.
    #[error(transparent)]
    Version(#[from] VersionError),

    /// A global middleware tag or a manual route was rejected.
    #[error(transparent)]
    Route(#[from] RouteError),
}

type RouteSetup = Box<dyn Fn(&mut RouteTableBuilder) -> Result<(), RouteError> + Send + Sync>;

/// Application-specific parts of the bootstrap: which controllers to
/// discover, extra middleware, and hand-written routes.
///
/// ```
/// use farmgate::AppSetup;
///
/// let setup = AppSetup::new()
///     .controller("app::users_controller")
///     .global("auth");
/// ```
pub struct AppSetup {
    controllers: Vec<String>,
    scans: Vec<(PathBuf, String, bool)>,
    middleware: MiddlewareRegistry,
    globals: Vec<String>,
    routes: Option<RouteSetup>,
    lookup: Arc<dyn ConfigLookup>,
}

impl Default for AppSetup {
    fn default() -> Self {
        Self::new()
    }
}

impl AppSetup {
    /// Starts from the standard middleware registry and the process environment.
    #[must_use]
    pub fn new() -> Self {
        Self {
            controllers: Vec::new(),
            scans: Vec::new(),
            middleware: MiddlewareRegistry::standard(),
            globals: Vec::new(),
            routes: None,
            lookup: Arc::new(EnvLookup),
        }
    }

    /// Registers a catalog controller for discovery.
    #[must_use]
    pub fn controller(mut self, id: impl Into<String>) -> Self {
        self.controllers.push(id.into());
        self
    }

    /// Registers every catalog controller found under `base`.
    #[must_use]
    pub fn scan(
        mut self,
        base: impl Into<PathBuf>,
        namespace: impl Into<String>,
        recursive: bool,
    ) -> Self {
        self.scans.push((base.into(), namespace.into(), recursive));
        self
    }

    /// Adds a named middleware to the registry.
    #[must_use]
    pub fn middleware(mut self, name: impl Into<String>, middleware: BoxedMiddleware) -> Self {
        self.middleware.register(name, middleware);
        self
    }

    /// Runs the named middleware before every route.
    #[must_use]
    pub fn global(mut self, tag: impl Into<String>) -> Self {
        self.globals.push(tag.into());
        self
    }

    /// Adds routes by hand after the discovered ones.
    #[must_use]
    pub fn routes<F>(mut self, setup: F) -> Self
    where
        F: Fn(&mut RouteTableBuilder) -> Result<(), RouteError> + Send + Sync + 'static,
    {
        self.routes = Some(Box::new(setup));
        self
    }

    /// Replaces the lookup used for the sunset date fallback.
    #[must_use]
    pub fn lookup(mut self, lookup: Arc<dyn ConfigLookup>) -> Self {
        self.lookup = lookup;
        self
    }
}

impl std::fmt::Debug for AppSetup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppSetup")
            .field("controllers", &self.controllers)
            .field("globals", &self.globals)
            .field("middleware", &self.middleware.names())
            .finish_non_exhaustive()
    }
}

/// A dispatcher together with the discovery state that feeds it.
pub struct Application {
    config: FarmgateConfig,
    registry: ControllerRegistry,
    middleware: Arc<MiddlewareRegistry>,
    globals: Vec<String>,
    routes: Option<RouteSetup>,
    dispatcher: Arc<Dispatcher>,
}

impl Application {
    /// Builds the resolver, cache tiers, discovery and route table.
    ///
    /// Logging is left to [`init_logging`](crate::init_logging) so several
    /// applications can share one process.
    pub fn bootstrap(
        config: FarmgateConfig,
        catalog: ControllerCatalog,
        setup: AppSetup,
    ) -> Result<Self, BootstrapError> {
        config.validate()?;
        farmgate_telemetry::describe_metrics();

        let versions = Arc::new(version_resolver(&config, Arc::clone(&setup.lookup))?);

        let mut registry = ControllerRegistry::new(Arc::new(catalog))
            .with_settings(discovery_settings(&config))
            .with_local_cache(local_tier(&config))
            .with_shared_cache(shared_tier(&config));

        for id in &setup.controllers {
            if !registry.register(id) {
                tracing::warn!(controller = %id, "controller not in catalog");
            }
        }
        for (base, namespace, recursive) in &setup.scans {
            if let Err(error) = registry.discover_directory(base, namespace, *recursive) {
                tracing::warn!(
                    base = %base.display(),
                    error = %error,
                    "controller scan skipped"
                );
            }
        }

        let middleware = Arc::new(setup.middleware);
        let (table, outcome) =
            build_table(&registry, &middleware, &setup.globals, setup.routes.as_ref())?;
        let decoder = BodyDecoder::new(
            config.dispatch.max_payload_bytes,
            config.dispatch.json_preview_chars,
        );
        let dispatcher = Arc::new(Dispatcher::new(table, versions).with_decoder(decoder));

        tracing::info!(
            route_count = dispatcher.routes().len(),
            outcome = ?outcome,
            "application ready"
        );
        Ok(Self {
            config,
            registry,
            middleware,
            globals: setup.globals,
            routes: setup.routes,
            dispatcher,
        })
    }

    /// Returns the dispatcher.
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Returns the controller registry.
    pub fn registry(&self) -> &ControllerRegistry {
        &self.registry
    }

    /// Returns the configuration the application was built from.
    pub fn config(&self) -> &FarmgateConfig {
        &self.config
    }

    /// Re-runs discovery and publishes a fresh route table.
    ///
    /// Requests already being dispatched finish on the table they started with.
    pub fn rebuild(&self) -> Result<DiscoveryOutcome, BootstrapError> {
        let (table, outcome) = build_table(
            &self.registry,
            &self.middleware,
            &self.globals,
            self.routes.as_ref(),
        )?;
        let route_count = table.len();
        self.dispatcher.publish(table);
        tracing::info!(route_count, outcome = ?outcome, "route table rebuilt");
        Ok(outcome)
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("registry", &self.registry)
            .field("globals", &self.globals)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

fn build_table(
    registry: &ControllerRegistry,
    middleware: &Arc<MiddlewareRegistry>,
    globals: &[String],
    routes: Option<&RouteSetup>,
) -> Result<(RouteTable, DiscoveryOutcome), BootstrapError> {
    let mut builder = RouteTableBuilder::new(Arc::clone(middleware));
    for tag in globals {
        builder.global(tag)?;
    }

    let discovery = registry.discover();
    registry.register_with_router(&discovery.routes, &mut builder);

    if let Some(routes) = routes {
        routes(&mut builder)?;
    }

    Ok((builder.build(), discovery.outcome))
}

fn version_resolver(
    config: &FarmgateConfig,
    lookup: Arc<dyn ConfigLookup>,
) -> Result<VersionResolver, VersionError> {
    let versioning = &config.versioning;
    let mut builder = VersionResolver::builder()
        .supported(versioning.supported.iter().cloned())
        .sunset_env_key(versioning.sunset_env_key.clone())
        .lookup(lookup);
    for (version, sunset) in &versioning.deprecated {
        builder = builder.deprecate(version.clone(), Some(sunset.as_str()));
    }
    builder.build()
}

fn discovery_settings(config: &FarmgateConfig) -> DiscoverySettings {
    DiscoverySettings {
        cache_key: config.discovery.cache_key.clone(),
        cache_ttl: Duration::from_secs(config.discovery.cache_ttl_secs),
        scan_ttl: Duration::from_secs(config.discovery.scan_ttl_secs),
    }
}

fn local_tier(config: &FarmgateConfig) -> Option<Arc<dyn CacheStore>> {
    config
        .discovery
        .local_cache_enabled
        .then(|| Arc::new(LocalCache::new()) as Arc<dyn CacheStore>)
}

/// An unopenable shared directory degrades to a tier that always misses.
fn shared_tier(config: &FarmgateConfig) -> Arc<dyn CacheStore> {
    let Some(dir) = &config.discovery.shared_cache_dir else {
        return Arc::new(NullCache);
    };
    match FileCache::open(dir.clone()) {
        Ok(cache) => Arc::new(cache),
        Err(error) => {
            tracing::warn!(
                dir = %dir.display(),
                error = %error,
                "shared route cache unavailable, recomputing on every miss"
            );
            Arc::new(NullCache)
        }
    }
}
