//! Request dispatch.
//!
//! The dispatcher owns the live route table and runs the full pipeline for
//! each request:
//!
//! 1. Seed trace identifiers from the incoming headers
//! 2. Resolve the API version
//! 3. Split off the query string and strip the version prefix
//! 4. Find the first matching route
//! 5. Decode the body (size cap, JSON, form, multipart)
//! 6. Run the route's middleware chain and handler
//!
//! Every response, including errors, leaves with the trace and version headers.

use crate::route::Route;
use crate::table::RouteTable;
use arc_swap::ArcSwap;
use bytes::Bytes;
use farmgate_core::{
    BoxFuture, BoxedHandler, DispatchError, HttpMethod, JsonEmitter, Request, RequestContext,
    Response, ResponseEmitter, TraceIdentifiers,
};
use farmgate_extract::{parse_query, BodyDecoder};
use farmgate_middleware::Endpoint;
use farmgate_versioning::{strip_version_prefix, VersionResolver};
use http::HeaderMap;
use std::sync::Arc;

/// Message key for requests that match no route.
pub const ENDPOINT_NOT_FOUND: &str = "endpoint_not_found";

/// Dispatches requests against a published [`RouteTable`].
///
/// The table is held in an [`ArcSwap`]: [`publish`](Self::publish) swaps in a
/// new snapshot atomically while in-flight requests finish on the one they loaded.
pub struct Dispatcher {
    table: ArcSwap<RouteTable>,
    versions: Arc<VersionResolver>,
    decoder: BodyDecoder,
    emitter: Arc<dyn ResponseEmitter>,
}

impl Dispatcher {
    /// Creates a dispatcher with the default body decoder and [`JsonEmitter`].
    #[must_use]
    pub fn new(table: RouteTable, versions: Arc<VersionResolver>) -> Self {
        Self {
            table: ArcSwap::from_pointee(table),
            versions,
            decoder: BodyDecoder::default(),
            emitter: Arc::new(JsonEmitter),
        }
    }

    /// Replaces the body decoder.
    #[must_use]
    pub fn with_decoder(mut self, decoder: BodyDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    /// Replaces the response emitter.
    #[must_use]
    pub fn with_emitter(mut self, emitter: Arc<dyn ResponseEmitter>) -> Self {
        self.emitter = emitter;
        self
    }

    /// Atomically replaces the route table.
    pub fn publish(&self, table: RouteTable) {
        tracing::info!(route_count = table.len(), "publishing route table");
        self.table.store(Arc::new(table));
    }

    /// Returns the current route table snapshot.
    #[must_use]
    pub fn routes(&self) -> Arc<RouteTable> {
        self.table.load_full()
    }

    /// Returns the version resolver.
    #[must_use]
    pub fn versions(&self) -> &Arc<VersionResolver> {
        &self.versions
    }

    /// Dispatches a buffered `http::Request`.
    pub async fn dispatch_request(&self, request: http::Request<Bytes>) -> Response {
        let (parts, body) = request.into_parts();
        let target = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path(), |pq| pq.as_str());
        self.dispatch(&parts.method, target, parts.headers, body).await
    }

    /// Dispatches a request given its method, request target (path plus
    /// optional query string), headers and buffered body.
    pub async fn dispatch(
        &self,
        method: &http::Method,
        target: &str,
        headers: HeaderMap,
        body: Bytes,
    ) -> Response {
        let trace = TraceIdentifiers::from_headers(&headers);
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        let version = self.versions.resolve(path, &headers);
        let route_path = strip_version_prefix(path);

        tracing::debug!(
            method = %method,
            path = %path,
            route_path = %route_path,
            api_version = %version.version,
            correlation_id = %trace.correlation_id,
            request_id = %trace.request_id,
            "dispatching request"
        );

        let mut ctx = RequestContext::with_trace(trace).with_version(version);
        let table = self.table.load_full();

        let mut response = self
            .route(&table, &mut ctx, method, path, route_path, query, headers, body)
            .await;
        self.finish(&ctx, &mut response);

        let status = response.status();
        metrics::counter!("farmgate_dispatch_total", "status" => status.as_str().to_owned())
            .increment(1);
        tracing::debug!(
            status = status.as_u16(),
            elapsed_ms = ctx.elapsed().as_millis() as u64,
            "request completed"
        );

        response
    }

    #[allow(clippy::too_many_arguments)]
    async fn route(
        &self,
        table: &RouteTable,
        ctx: &mut RequestContext,
        method: &http::Method,
        path: &str,
        route_path: String,
        query: &str,
        headers: HeaderMap,
        body: Bytes,
    ) -> Response {
        let Some(method) = HttpMethod::from_http(method) else {
            tracing::info!(method = %method, path = %path, "unsupported method");
            return self.emitter.not_found(ENDPOINT_NOT_FOUND);
        };

        let Some(found) = table.find(method, &route_path) else {
            let allowed = table.allowed_methods(&route_path);
            if allowed.is_empty() {
                tracing::info!(method = %method, path = %path, "no route matched");
            } else {
                tracing::info!(
                    method = %method,
                    path = %path,
                    allowed = ?allowed,
                    "method not registered for path"
                );
            }
            return self.emitter.not_found(ENDPOINT_NOT_FOUND);
        };

        let body = match self.decoder.decode(&headers, body).await {
            Ok(body) => body,
            Err(e) => return self.emitter.from_error(&e),
        };

        let route: &Route = found.route;
        ctx.set_route(route.matched(), route.is_public());

        let request = Request::new(method, path)
            .with_route_path(route_path)
            .with_query(parse_query(query))
            .with_headers(headers)
            .with_body(body)
            .with_params(found.params);

        let endpoint = HandlerEndpoint {
            handler: &route.handler,
            emitter: self.emitter.as_ref(),
        };
        route.chain().run(ctx, request, &endpoint).await
    }

    fn finish(&self, ctx: &RequestContext, response: &mut Response) {
        let headers = response.headers_mut();
        ctx.trace().apply_to(headers);
        if let Some(version) = ctx.version() {
            headers.extend(self.versions.deprecation_headers(&version.version));
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.table.load().len())
            .field("versions", &self.versions)
            .field("decoder", &self.decoder)
            .finish_non_exhaustive()
    }
}

/// Terminal chain element: calls the route handler and renders its errors.
struct HandlerEndpoint<'h> {
    handler: &'h BoxedHandler,
    emitter: &'h dyn ResponseEmitter,
}

impl Endpoint for HandlerEndpoint<'_> {
    fn call<'a>(&'a self, ctx: &'a mut RequestContext, request: Request) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let params = request.positional_params();
            match self.handler.call(ctx.clone(), request, params).await {
                Ok(response) => response,
                Err(e) => {
                    log_handler_error(&e);
                    self.emitter.from_error(&e)
                }
            }
        })
    }
}

fn log_handler_error(err: &DispatchError) {
    match err {
        DispatchError::Internal { .. } => {
            tracing::error!(error = %err, code = err.code(), "handler failed");
        }
        _ => tracing::debug!(error = %err, code = err.code(), "handler returned error"),
    }
}
