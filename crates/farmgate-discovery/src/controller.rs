//! Controller metadata and the controller contract.
//!
//! A controller declares its routes through [`Controller::metadata`]: a
//! [`RouteGroup`] shared by every action plus one [`ActionMeta`] per action.
//!
//! ```
//! use farmgate_discovery::{ActionMeta, ControllerMetadata, RouteGroup};
//!
//! let meta = ControllerMetadata::new(RouteGroup::new("/users").middleware(["auth"]))
//!     .action(ActionMeta::get("index", "/"))
//!     .action(ActionMeta::get("show", "/{id}").middleware(["permission:users:read"]))
//!     .action(ActionMeta::post("signup", "/signup").public().legacy_input());
//!
//! assert_eq!(meta.actions.len(), 3);
//! assert!(meta.actions[2].is_public);
//! ```

use farmgate_core::{BoxFuture, DispatchResult, HttpMethod, Request, RequestContext, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// How an action wants its request delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionInput {
    /// The typed [`Request`].
    #[default]
    Request,
    /// A flat JSON object built with [`Request::to_legacy_map`].
    Legacy,
}

/// What an action receives.
#[derive(Debug, Clone)]
pub enum ActionPayload {
    /// The typed request.
    Request(Request),
    /// The flattened request.
    Legacy(Map<String, Value>),
}

impl ActionPayload {
    pub(crate) fn build(input: ActionInput, request: Request) -> Self {
        match input {
            ActionInput::Request => Self::Request(request),
            ActionInput::Legacy => Self::Legacy(request.to_legacy_map()),
        }
    }

    /// Returns the typed request, if delivered that way.
    #[must_use]
    pub fn request(&self) -> Option<&Request> {
        match self {
            Self::Request(r) => Some(r),
            Self::Legacy(_) => None,
        }
    }

    /// Returns the legacy map, if delivered that way.
    #[must_use]
    pub fn legacy(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Legacy(m) => Some(m),
            Self::Request(_) => None,
        }
    }
}

/// Prefix and middleware shared by every action of a controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteGroup {
    /// Path prefix, e.g. `/users`.
    pub prefix: String,
    /// Middleware tags run before each action's own.
    pub middleware: Vec<String>,
}

impl RouteGroup {
    /// Creates a group with no middleware.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            middleware: Vec::new(),
        }
    }

    /// Appends middleware tags.
    #[must_use]
    pub fn middleware<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.middleware.extend(tags.into_iter().map(Into::into));
        self
    }
}

/// Route metadata for one controller action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionMeta {
    /// Action name passed back to [`Controller::call`].
    pub name: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Path relative to the group prefix.
    pub path: String,
    /// Action-specific middleware tags.
    pub middleware: Vec<String>,
    /// Public actions skip authentication middleware.
    pub is_public: bool,
    /// Payload style.
    pub input: ActionInput,
    /// Human-readable summary for route listings.
    pub description: Option<String>,
}

impl ActionMeta {
    /// Creates action metadata.
    #[must_use]
    pub fn new(method: HttpMethod, name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method,
            path: path.into(),
            middleware: Vec::new(),
            is_public: false,
            input: ActionInput::Request,
            description: None,
        }
    }

    /// `GET` action.
    #[must_use]
    pub fn get(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, name, path)
    }

    /// `POST` action.
    #[must_use]
    pub fn post(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, name, path)
    }

    /// `PUT` action.
    #[must_use]
    pub fn put(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, name, path)
    }

    /// `DELETE` action.
    #[must_use]
    pub fn delete(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, name, path)
    }

    /// Appends middleware tags.
    #[must_use]
    pub fn middleware<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.middleware.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Marks the action public.
    #[must_use]
    pub fn public(mut self) -> Self {
        self.is_public = true;
        self
    }

    /// Sets the listing description.
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Delivers the request as a legacy map.
    #[must_use]
    pub fn legacy_input(mut self) -> Self {
        self.input = ActionInput::Legacy;
        self
    }
}

/// Everything discovery needs to know about a controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerMetadata {
    /// Shared prefix and middleware.
    pub group: RouteGroup,
    /// Actions in declaration order.
    pub actions: Vec<ActionMeta>,
}

impl ControllerMetadata {
    /// Creates metadata with no actions.
    #[must_use]
    pub fn new(group: RouteGroup) -> Self {
        Self {
            group,
            actions: Vec::new(),
        }
    }

    /// Appends an action.
    #[must_use]
    pub fn action(mut self, action: ActionMeta) -> Self {
        self.actions.push(action);
        self
    }
}

/// A routable controller.
///
/// Instances are built once per process with [`Controller::construct`] and
/// shared across requests.
pub trait Controller: Send + Sync + 'static {
    /// Describes the controller's routes.
    fn metadata() -> ControllerMetadata
    where
        Self: Sized;

    /// Builds the shared instance.
    fn construct() -> anyhow::Result<Self>
    where
        Self: Sized;

    /// Invokes `action`. `params` are the path parameters in template order.
    fn call(
        self: Arc<Self>,
        action: &str,
        ctx: RequestContext,
        input: ActionPayload,
        params: Vec<String>,
    ) -> BoxFuture<'static, DispatchResult<Response>>;
}

impl std::fmt::Debug for dyn Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Controller")
    }
}
