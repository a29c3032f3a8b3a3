//! Route cache lifecycle and router binding tests.

use bytes::Bytes;
use farmgate_core::{
    BoxFuture, DispatchResult, JsonEmitter, RequestContext, Response, ResponseEmitter,
};
use farmgate_discovery::{
    ActionMeta, ActionPayload, CacheStore, CacheTier, Controller, ControllerCatalog,
    ControllerDescriptor, ControllerMetadata, ControllerRegistry, DiscoveryOutcome, FileCache,
    RouteGroup,
};
use farmgate_middleware::MiddlewareRegistry;
use farmgate_router::{Dispatcher, RouteTableBuilder};
use farmgate_versioning::VersionResolver;
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

struct UsersController;

impl Controller for UsersController {
    fn metadata() -> ControllerMetadata {
        ControllerMetadata::new(RouteGroup::new("/users"))
            .action(ActionMeta::get("index", "/"))
            .action(ActionMeta::get("show", "/{id}"))
            .action(ActionMeta::post("create", "/").public().legacy_input())
            .action(ActionMeta::delete("destroy", "/{id}").middleware(["auth"]))
    }

    fn construct() -> anyhow::Result<Self> {
        Ok(Self)
    }

    fn call(
        self: Arc<Self>,
        action: &str,
        _ctx: RequestContext,
        input: ActionPayload,
        params: Vec<String>,
    ) -> BoxFuture<'static, DispatchResult<Response>> {
        let action = action.to_string();
        Box::pin(async move {
            let data = match &input {
                ActionPayload::Request(req) => {
                    json!({ "action": action, "params": params, "path": req.route_path() })
                }
                ActionPayload::Legacy(map) => {
                    json!({ "action": action, "params": params, "legacy": map })
                }
            };
            Ok(JsonEmitter.success("ok", data, StatusCode::OK))
        })
    }
}

struct FarmsController;

impl Controller for FarmsController {
    fn metadata() -> ControllerMetadata {
        ControllerMetadata::new(RouteGroup::new("/farms")).action(ActionMeta::get("index", "/"))
    }

    fn construct() -> anyhow::Result<Self> {
        Ok(Self)
    }

    fn call(
        self: Arc<Self>,
        _action: &str,
        _ctx: RequestContext,
        _input: ActionPayload,
        _params: Vec<String>,
    ) -> BoxFuture<'static, DispatchResult<Response>> {
        Box::pin(async { Ok(JsonEmitter.success("ok", Value::Null, StatusCode::OK)) })
    }
}

static COUNTED_BUILDS: AtomicUsize = AtomicUsize::new(0);

struct CountedController;

impl Controller for CountedController {
    fn metadata() -> ControllerMetadata {
        ControllerMetadata::new(RouteGroup::new("/counted"))
            .action(ActionMeta::get("a", "/a"))
            .action(ActionMeta::get("b", "/b"))
    }

    fn construct() -> anyhow::Result<Self> {
        COUNTED_BUILDS.fetch_add(1, Ordering::SeqCst);
        Ok(Self)
    }

    fn call(
        self: Arc<Self>,
        _action: &str,
        _ctx: RequestContext,
        _input: ActionPayload,
        _params: Vec<String>,
    ) -> BoxFuture<'static, DispatchResult<Response>> {
        Box::pin(async { Ok(JsonEmitter.success("ok", Value::Null, StatusCode::OK)) })
    }
}

struct BrokenController;

impl Controller for BrokenController {
    fn metadata() -> ControllerMetadata {
        ControllerMetadata::new(RouteGroup::new("/broken")).action(ActionMeta::get("index", "/"))
    }

    fn construct() -> anyhow::Result<Self> {
        anyhow::bail!("database offline")
    }

    fn call(
        self: Arc<Self>,
        _action: &str,
        _ctx: RequestContext,
        _input: ActionPayload,
        _params: Vec<String>,
    ) -> BoxFuture<'static, DispatchResult<Response>> {
        Box::pin(async { Ok(JsonEmitter.success("ok", Value::Null, StatusCode::OK)) })
    }
}

struct Workspace {
    _dir: tempfile::TempDir,
    cache_dir: PathBuf,
    users: PathBuf,
    farms: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        let users = src.join("users_controller.rs");
        let farms = src.join("farms_controller.rs");
        fs::write(&users, "// users").unwrap();
        fs::write(&farms, "// farms").unwrap();
        Self {
            cache_dir: dir.path().join("cache"),
            _dir: dir,
            users,
            farms,
        }
    }

    fn catalog(&self) -> Arc<ControllerCatalog> {
        Arc::new(
            ControllerCatalog::new()
                .with(ControllerDescriptor::of::<UsersController>("app::users_controller", &self.users))
                .with(ControllerDescriptor::of::<FarmsController>("app::farms_controller", &self.farms))
                .with(ControllerDescriptor::of::<CountedController>("app::counted_controller", &self.users))
                .with(ControllerDescriptor::of::<BrokenController>("app::broken_controller", &self.users)),
        )
    }

    fn shared(&self) -> Arc<dyn CacheStore> {
        Arc::new(FileCache::open(&self.cache_dir).unwrap())
    }

    /// A registry as a freshly started process would build it.
    fn registry(&self) -> ControllerRegistry {
        let mut registry = ControllerRegistry::new(self.catalog()).with_shared_cache(self.shared());
        assert!(registry.register("app::users_controller"));
        registry
    }
}

fn touch(path: &Path) {
    let later = SystemTime::now() + Duration::from_secs(120);
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(later)
        .unwrap();
}

#[test]
fn test_tiers_are_consulted_in_order() {
    let ws = Workspace::new();

    let first = ws.registry();
    let fresh = first.discover();
    assert_eq!(fresh.outcome, DiscoveryOutcome::Discovered);
    assert_eq!(fresh.routes.len(), 4);

    let again = first.discover();
    assert_eq!(again.outcome, DiscoveryOutcome::Cached(CacheTier::Local));
    assert_eq!(again.routes, fresh.routes);

    // a new process has an empty local tier but shares the file cache
    let second = ws.registry();
    let shared = second.discover();
    assert_eq!(shared.outcome, DiscoveryOutcome::Cached(CacheTier::Shared));
    assert_eq!(shared.routes, fresh.routes);
    assert_eq!(
        second.discover().outcome,
        DiscoveryOutcome::Cached(CacheTier::Local)
    );
}

#[test]
fn test_modified_source_invalidates_and_rediscovers() {
    let ws = Workspace::new();
    let registry = ws.registry();
    let original = registry.discover_routes();

    touch(&ws.users);

    let rediscovered = registry.discover();
    assert_eq!(rediscovered.outcome, DiscoveryOutcome::Discovered);
    assert_eq!(rediscovered.routes, original);

    // the rewritten snapshot is valid again for every process
    assert_eq!(
        ws.registry().discover().outcome,
        DiscoveryOutcome::Cached(CacheTier::Shared)
    );
}

#[test]
fn test_deleted_source_invalidates() {
    let ws = Workspace::new();
    let registry = ws.registry();
    registry.discover();

    fs::remove_file(&ws.users).unwrap();
    assert_eq!(registry.discover().outcome, DiscoveryOutcome::Discovered);
}

#[test]
fn test_registering_a_controller_invalidates() {
    let ws = Workspace::new();
    let mut registry = ws.registry();
    registry.discover();

    assert!(registry.register("app::farms_controller"));
    let grown = registry.discover();
    assert_eq!(grown.outcome, DiscoveryOutcome::Discovered);
    assert_eq!(grown.routes.len(), 5);
    assert_eq!(grown.routes[4].path, "/farms");
}

#[test]
fn test_unresolvable_controller_is_ignored() {
    let ws = Workspace::new();
    let mut registry = ws.registry();
    assert!(!registry.register("app::ghost_controller"));
    assert!(registry.register("app::users_controller"));
    assert_eq!(registry.registered(), vec!["app::users_controller"]);
}

#[test]
fn test_clear_cache_forces_discovery() {
    let ws = Workspace::new();
    let registry = ws.registry();
    registry.discover();
    registry.clear_cache();

    assert_eq!(registry.discover().outcome, DiscoveryOutcome::Discovered);
}

#[test]
fn test_unreadable_shared_entry_is_recomputed() {
    let ws = Workspace::new();
    let registry = ws.registry();
    let shared = ws.shared();
    shared
        .set("farmgate:routes", "{ not json", Duration::from_secs(60))
        .unwrap();

    let result = registry.discover();
    assert_eq!(result.outcome, DiscoveryOutcome::Discovered);
    assert_eq!(result.routes.len(), 4);
}

#[test]
fn test_controllers_are_built_once() {
    let ws = Workspace::new();
    let mut registry = ControllerRegistry::new(ws.catalog());
    registry.register("app::counted_controller");
    registry.register("app::broken_controller");

    let routes = registry.discover_routes();
    assert_eq!(routes.len(), 3);

    let mut builder = RouteTableBuilder::new(Arc::new(MiddlewareRegistry::standard()));
    // the broken controller's route is skipped
    assert_eq!(registry.register_with_router(&routes, &mut builder), 2);
    assert_eq!(COUNTED_BUILDS.load(Ordering::SeqCst), 1);

    registry.instance("app::counted_controller").unwrap();
    assert_eq!(COUNTED_BUILDS.load(Ordering::SeqCst), 1);
}

#[test]
fn test_directory_scan_is_cached() {
    let ws = Workspace::new();
    let src = ws.users.parent().unwrap().to_path_buf();

    let mut registry = ControllerRegistry::new(ws.catalog()).with_shared_cache(ws.shared());
    assert_eq!(registry.discover_directory(&src, "app", false).unwrap(), 2);
    assert_eq!(
        registry.registered(),
        vec!["app::farms_controller", "app::users_controller"]
    );

    // the second scan is served from the shared tier
    fs::remove_file(&ws.farms).unwrap();
    let mut other = ControllerRegistry::new(ws.catalog()).with_shared_cache(ws.shared());
    assert_eq!(other.discover_directory(&src, "app", false).unwrap(), 2);
    assert_eq!(other.registered().len(), 2);
}

async fn body(res: Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_discovered_routes_dispatch() {
    let ws = Workspace::new();
    let registry = ws.registry();
    let routes = registry.discover_routes();

    let mut builder = RouteTableBuilder::new(Arc::new(MiddlewareRegistry::standard()));
    assert_eq!(registry.register_with_router(&routes, &mut builder), 4);
    let versions = Arc::new(VersionResolver::builder().supported(["v1"]).build().unwrap());
    let dispatcher = Dispatcher::new(builder.build(), versions);

    let res = dispatcher
        .dispatch(&Method::GET, "/v1/users/5", HeaderMap::new(), Bytes::new())
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let data = body(res).await["data"].clone();
    assert_eq!(data["action"], "show");
    assert_eq!(data["params"], json!(["5"]));
    assert_eq!(data["path"], "/users/5");

    let mut headers = HeaderMap::new();
    headers.insert(http::header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    let res = dispatcher
        .dispatch(
            &Method::POST,
            "/users?source=web",
            headers,
            Bytes::from_static(b"{\"name\":\"Ada\"}"),
        )
        .await;
    let data = body(res).await["data"].clone();
    assert_eq!(data["action"], "create");
    assert_eq!(data["legacy"], json!({ "source": "web", "name": "Ada" }));

    let res = dispatcher
        .dispatch(&Method::DELETE, "/users/5", HeaderMap::new(), Bytes::new())
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}
