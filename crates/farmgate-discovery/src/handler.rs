//! Adapts a controller action to the [`Handler`] contract.

use crate::controller::{ActionInput, ActionPayload, Controller};
use farmgate_core::{BoxFuture, DispatchResult, Handler, Request, RequestContext, Response};
use std::sync::Arc;

/// Calls one action on a shared controller instance.
pub struct ActionHandler {
    controller: Arc<dyn Controller>,
    action: String,
    input: ActionInput,
}

impl ActionHandler {
    /// Binds `action` on `controller`.
    #[must_use]
    pub fn new(controller: Arc<dyn Controller>, action: impl Into<String>, input: ActionInput) -> Self {
        Self {
            controller,
            action: action.into(),
            input,
        }
    }

    /// Returns the bound action name.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }
}

impl Handler for ActionHandler {
    fn call(
        &self,
        ctx: RequestContext,
        request: Request,
        params: Vec<String>,
    ) -> BoxFuture<'static, DispatchResult<Response>> {
        let payload = ActionPayload::build(self.input, request);
        Arc::clone(&self.controller).call(&self.action, ctx, payload, params)
    }
}

impl std::fmt::Debug for ActionHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionHandler")
            .field("action", &self.action)
            .field("input", &self.input)
            .finish_non_exhaustive()
    }
}
