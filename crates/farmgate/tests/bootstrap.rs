//! Bootstrapping an application from configuration and dispatching through it.

use bytes::Bytes;
use farmgate::core::MapLookup;
use farmgate::discovery::CacheTier;
use farmgate::prelude::*;
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

struct FieldsController;

impl Controller for FieldsController {
    fn metadata() -> ControllerMetadata {
        ControllerMetadata::new(RouteGroup::new("/fields"))
            .action(ActionMeta::get("index", "/").public())
            .action(ActionMeta::get("show", "/{id}").public())
            .action(ActionMeta::delete("destroy", "/{id}").middleware(["auth"]))
    }

    fn construct() -> anyhow::Result<Self> {
        Ok(Self)
    }

    fn call(
        self: Arc<Self>,
        action: &str,
        _ctx: RequestContext,
        _input: ActionPayload,
        params: Vec<String>,
    ) -> BoxFuture<'static, DispatchResult<Response>> {
        let action = action.to_string();
        Box::pin(async move {
            Ok(JsonEmitter.success(
                "fields",
                json!({ "action": action, "params": params }),
                StatusCode::OK,
            ))
        })
    }
}

struct Stamp;

impl Middleware for Stamp {
    fn name(&self) -> &str {
        "stamp"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let mut response = next.run(ctx, request).await;
            response
                .headers_mut()
                .insert("x-farm", HeaderValue::from_static("gate"));
            response
        })
    }
}

struct Farm {
    _dir: TempDir,
    source: PathBuf,
    cache: PathBuf,
}

impl Farm {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        let source = src.join("fields_controller.rs");
        fs::write(&source, "// fields").unwrap();
        let cache = dir.path().join("cache");
        Self {
            _dir: dir,
            source,
            cache,
        }
    }

    fn catalog(&self) -> ControllerCatalog {
        ControllerCatalog::new().with(ControllerDescriptor::of::<FieldsController>(
            "app::fields_controller",
            &self.source,
        ))
    }

    fn config(&self) -> FarmgateConfig {
        let mut config = FarmgateConfig::default();
        config.versioning.supported = vec!["v1".into(), "v2".into()];
        config
            .versioning
            .deprecated
            .insert("v1".into(), String::new());
        config.discovery.shared_cache_dir = Some(self.cache.clone());
        config
    }

    fn setup(&self) -> AppSetup {
        AppSetup::new()
            .controller("app::fields_controller")
            .middleware("stamp", Arc::new(Stamp))
            .global("stamp")
            .lookup(Arc::new(MapLookup::new().with("API_SUNSET_DATE", "2027-12-31")))
            .routes(|builder| {
                builder.get(
                    "/ping",
                    handler_fn(|_ctx, _req, _params| async {
                        Ok(JsonEmitter.success("pong", Value::Null, StatusCode::OK))
                    }),
                    &[],
                    true,
                )
            })
    }

    fn bootstrap(&self) -> Application {
        Application::bootstrap(self.config(), self.catalog(), self.setup()).unwrap()
    }
}

async fn get(app: &Application, target: &str) -> Response {
    app.dispatcher()
        .dispatch(&Method::GET, target, HeaderMap::new(), Bytes::new())
        .await
}

async fn body(res: Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_discovered_and_manual_routes_dispatch() {
    let farm = Farm::new();
    let app = farm.bootstrap();

    assert_eq!(app.dispatcher().routes().len(), 4);

    let res = get(&app, "/v1/fields/7").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-farm"], "gate");
    assert_eq!(res.headers()["x-api-version"], "v1");
    assert_eq!(res.headers()["x-api-deprecated"], "true");
    assert_eq!(res.headers()["x-api-sunset-date"], "2027-12-31");
    let data = body(res).await["data"].clone();
    assert_eq!(data, json!({ "action": "show", "params": ["7"] }));

    let res = get(&app, "/v2/ping").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-api-version"], "v2");
    assert!(res.headers().get("x-api-deprecated").is_none());

    let res = app
        .dispatcher()
        .dispatch(&Method::DELETE, "/fields/7", HeaderMap::new(), Bytes::new())
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_payload_cap_comes_from_config() {
    let farm = Farm::new();
    let mut config = farm.config();
    config.dispatch.max_payload_bytes = 8;
    let app = Application::bootstrap(config, farm.catalog(), farm.setup()).unwrap();

    let mut headers = HeaderMap::new();
    headers.insert(
        http::header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    let res = app
        .dispatcher()
        .dispatch(
            &Method::GET,
            "/ping",
            headers,
            Bytes::from_static(b"{\"field\":\"north\"}"),
        )
        .await;
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[test]
fn test_rebuild_uses_cache_until_source_changes() {
    let farm = Farm::new();
    let app = farm.bootstrap();

    assert_eq!(app.rebuild().unwrap(), DiscoveryOutcome::Cached(CacheTier::Local));

    let second = farm.bootstrap();
    assert_eq!(second.rebuild().unwrap(), DiscoveryOutcome::Cached(CacheTier::Local));

    let later = SystemTime::now() + Duration::from_secs(60);
    fs::File::options()
        .write(true)
        .open(&farm.source)
        .unwrap()
        .set_modified(later)
        .unwrap();
    assert_eq!(app.rebuild().unwrap(), DiscoveryOutcome::Discovered);
    assert_eq!(app.dispatcher().routes().len(), 4);
}

#[test]
fn test_new_application_reads_shared_tier() {
    let farm = Farm::new();
    let _first = farm.bootstrap();

    let mut config = farm.config();
    config.discovery.local_cache_enabled = false;
    let app = Application::bootstrap(config, farm.catalog(), farm.setup()).unwrap();
    assert_eq!(app.rebuild().unwrap(), DiscoveryOutcome::Cached(CacheTier::Shared));
}

#[test]
fn test_unknown_controller_is_skipped() {
    let farm = Farm::new();
    let app = Application::bootstrap(
        farm.config(),
        farm.catalog(),
        farm.setup().controller("app::barns_controller"),
    )
    .unwrap();
    assert_eq!(app.registry().registered(), ["app::fields_controller"]);
}

#[test]
fn test_directory_scan_registers_controllers() {
    let farm = Farm::new();
    let base = farm.source.parent().unwrap().to_path_buf();
    let app = Application::bootstrap(
        farm.config(),
        farm.catalog(),
        AppSetup::new().scan(base, "app", false),
    )
    .unwrap();
    assert_eq!(app.registry().registered(), ["app::fields_controller"]);
    assert_eq!(app.dispatcher().routes().len(), 3);
}

#[tokio::test]
async fn test_unusable_shared_cache_dir_still_boots() {
    let farm = Farm::new();
    let blocker = farm.source.parent().unwrap().join("not_a_dir");
    fs::write(&blocker, "").unwrap();

    let mut config = farm.config();
    config.discovery.shared_cache_dir = Some(blocker.join("routes"));
    let app = Application::bootstrap(config, farm.catalog(), farm.setup()).unwrap();

    assert_eq!(app.dispatcher().routes().len(), 4);
    assert_eq!(get(&app, "/fields/7").await.status(), StatusCode::OK);
}

#[test]
fn test_missing_scan_dir_keeps_explicit_controllers() {
    let farm = Farm::new();
    let missing = farm.source.parent().unwrap().join("gone");
    let app = Application::bootstrap(
        farm.config(),
        farm.catalog(),
        farm.setup().scan(missing, "app", true),
    )
    .unwrap();
    assert_eq!(app.registry().registered(), ["app::fields_controller"]);
    assert_eq!(app.dispatcher().routes().len(), 4);
}
