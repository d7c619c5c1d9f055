//! Request dispatcher
//!
//! [`Bunwork`] owns the route table, the middleware chain and the static
//! routes. It is configured through `&mut self` methods and then shared
//! read-only (typically behind an `Arc`) with the connection layer, so no
//! registration can happen once serving has started.
//!
//! Dispatch order for every request:
//! 1. middlewares, in registration order; a halt yields 403
//! 2. route table lookup; a match invokes the handler and returns its response
//! 3. static routes; a matching prefix yields the file or a 404
//! 4. a plain 404
//!
//! There are no timeouts at this layer: a middleware or handler that never
//! completes keeps its request pending.

use crate::blueprint::Blueprint;
use crate::error::{DispatchError, RegistrationError};
use crate::handler::{HandlerResult, StaticRoutes};
use crate::http::{build_404_response, build_blocked_response, Request, Response};
use crate::middleware::{Flow, Middleware, MiddlewareChain};
use crate::routing::{parse_method, RouteEntry, RouteMatch, RouteTable};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Default)]
pub struct Bunwork {
    routes: RouteTable,
    middlewares: MiddlewareChain,
    static_routes: StaticRoutes,
}

impl Bunwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route handler. Registering the same method and pattern
    /// again replaces the earlier handler.
    pub fn route<F, Fut>(
        &mut self,
        method: &str,
        path: &str,
        handler: F,
    ) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let method = parse_method(method)?;
        self.routes.insert(method, path, Arc::new(handler))?;
        Ok(self)
    }

    pub fn get<F, Fut>(&mut self, path: &str, handler: F) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.route("GET", path, handler)
    }

    pub fn post<F, Fut>(&mut self, path: &str, handler: F) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.route("POST", path, handler)
    }

    pub fn put<F, Fut>(&mut self, path: &str, handler: F) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.route("PUT", path, handler)
    }

    pub fn delete<F, Fut>(&mut self, path: &str, handler: F) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.route("DELETE", path, handler)
    }

    /// Append a global middleware
    pub fn use_middleware<M: Middleware>(&mut self, middleware: M) -> &mut Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Serve files below `dir` for request paths starting with `prefix`
    pub fn static_route(&mut self, prefix: impl Into<String>, dir: impl Into<PathBuf>) -> &mut Self {
        self.static_routes.add(prefix, dir);
        self
    }

    /// Merge a blueprint: its routes join the route table, replacing any
    /// existing route at the same method and pattern, and its middlewares
    /// run after all middlewares registered so far.
    pub fn register_blueprint(&mut self, blueprint: Blueprint) -> Result<&mut Self, RegistrationError> {
        let (routes, middlewares) = blueprint.into_parts();

        // Patterns were validated when added to the blueprint
        for RouteEntry {
            method,
            pattern,
            handler,
        } in routes.routes()
        {
            self.routes.insert(method, &pattern, handler)?;
        }
        self.middlewares.append(middlewares);
        Ok(self)
    }

    /// Registered routes, sorted by method then pattern
    pub fn routes(&self) -> Vec<RouteEntry> {
        self.routes.routes()
    }

    pub const fn static_routes(&self) -> &StaticRoutes {
        &self.static_routes
    }

    pub fn middleware_count(&self) -> usize {
        self.middlewares.len()
    }

    /// Dispatch one request.
    ///
    /// Blocked, unmatched and static-file outcomes always produce `Ok`.
    /// Errors returned by user middlewares or handlers are passed through as
    /// [`DispatchError`] without being turned into a response.
    pub async fn handle(&self, mut req: Request) -> Result<Response, DispatchError> {
        let flow = self
            .middlewares
            .run(&mut req)
            .await
            .map_err(DispatchError::Middleware)?;
        if flow == Flow::Blocked {
            return Ok(build_blocked_response());
        }

        if let Some(RouteMatch { handler, params }) = self.routes.find(req.method(), req.path()) {
            if !params.is_empty() {
                req.attach_params(params);
            }
            return handler.call(req).await.map_err(DispatchError::Handler);
        }

        if let Some(response) = self.static_routes.serve(req.path()).await {
            return Ok(response);
        }

        Ok(build_404_response())
    }
}
