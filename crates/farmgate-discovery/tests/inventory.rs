//! Route listings built from registered controllers.

use farmgate_core::{
    BoxFuture, DispatchResult, HttpMethod, JsonEmitter, RequestContext, Response,
    ResponseEmitter,
};
use farmgate_discovery::{
    ActionMeta, ActionPayload, Controller, ControllerCatalog, ControllerDescriptor,
    ControllerMetadata, ControllerRegistry, DiscoveryOutcome, RouteGroup,
};
use http::StatusCode;
use serde_json::Value;
use std::sync::Arc;

struct FieldsController;

impl Controller for FieldsController {
    fn metadata() -> ControllerMetadata {
        ControllerMetadata::new(RouteGroup::new("/fields").middleware(["auth"]))
            .action(ActionMeta::get("index", "/").describe("List fields"))
            .action(ActionMeta::delete("destroy", "/{id}").middleware(["permission:fields:delete"]))
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

struct SilosController;

impl Controller for SilosController {
    fn metadata() -> ControllerMetadata {
        ControllerMetadata::new(RouteGroup::new("/silos"))
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

const SOURCE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/inventory.rs");

fn registry() -> ControllerRegistry {
    let catalog = ControllerCatalog::new()
        .with(ControllerDescriptor::of::<FieldsController>("app::fields_controller", SOURCE))
        .with(ControllerDescriptor::of::<SilosController>("app::silos_controller", SOURCE));
    let mut registry = ControllerRegistry::new(Arc::new(catalog));
    assert!(registry.register("app::fields_controller"));
    assert!(registry.register("app::silos_controller"));
    registry
}

#[test]
fn test_inventory_lists_routes_with_descriptions() {
    let inventory = registry().inventory();

    assert_eq!(inventory.routes.len(), 2);
    let index = &inventory.routes[0];
    assert_eq!(index.method, HttpMethod::Get);
    assert_eq!(index.path, "/fields");
    assert_eq!(index.handler.action, "index");
    assert_eq!(index.description.as_deref(), Some("List fields"));

    let destroy = &inventory.routes[1];
    assert_eq!(destroy.middleware, vec!["auth", "permission:fields:delete"]);
    assert!(destroy.description.is_none());

    assert_eq!(inventory.routes_for("app::fields_controller").count(), 2);
    assert_eq!(inventory.routes_for("app::silos_controller").count(), 0);
}

#[test]
fn test_inventory_reports_controllers_without_routes() {
    let inventory = registry().inventory();
    assert_eq!(inventory.controllers_without_routes, vec!["app::silos_controller"]);

    let json = serde_json::to_value(&inventory).unwrap();
    assert_eq!(json["controllers_without_routes"][0], "app::silos_controller");
    assert_eq!(json["routes"][0]["description"], "List fields");
}

#[test]
fn test_inventory_text_listing() {
    let listing = registry().inventory().to_string();
    let lines: Vec<&str> = listing.lines().collect();
    assert_eq!(
        lines,
        vec![
            "GET /fields -> app::fields_controller::index [auth] List fields",
            "DELETE /fields/{id} -> app::fields_controller::destroy [auth, permission:fields:delete] No description",
            "controllers without routes: 1",
            "  app::silos_controller",
        ]
    );
}

#[test]
fn test_description_is_kept_in_cached_snapshot() {
    let registry = registry();
    assert_eq!(registry.discover().outcome, DiscoveryOutcome::Discovered);

    let cached = registry.discover();
    assert!(matches!(cached.outcome, DiscoveryOutcome::Cached(_)));
    assert_eq!(cached.routes[0].description.as_deref(), Some("List fields"));
}
