//! Blueprints
//!
//! A blueprint groups routes and middlewares under a shared path prefix. It
//! cannot dispatch on its own; its contents take effect only once merged into
//! a [`Bunwork`](crate::Bunwork) with `register_blueprint`, which consumes it.

use crate::error::RegistrationError;
use crate::handler::{HandlerResult, SharedHandler};
use crate::http::Request;
use crate::middleware::{Middleware, MiddlewareChain};
use crate::routing::{parse_method, pattern::parse_pattern, RouteEntry, RouteTable};
use std::future::Future;
use std::sync::Arc;

pub struct Blueprint {
    name: String,
    prefix: String,
    routes: RouteTable,
    middlewares: MiddlewareChain,
}

impl Blueprint {
    /// Create an empty blueprint. `prefix` is prepended verbatim to every
    /// route path registered on it.
    pub fn new(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            routes: RouteTable::new(),
            middlewares: MiddlewareChain::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Register a route; the stored pattern is `prefix + path`
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
        self.add_route(method, path, Arc::new(handler))?;
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

    /// Append a middleware; it runs after every middleware registered on
    /// the dispatcher before the merge
    pub fn use_middleware<M: Middleware>(&mut self, middleware: M) -> &mut Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Routes registered so far, with the prefix applied
    pub fn routes(&self) -> Vec<RouteEntry> {
        self.routes.routes()
    }

    pub fn middleware_count(&self) -> usize {
        self.middlewares.len()
    }

    pub(crate) fn into_parts(self) -> (RouteTable, MiddlewareChain) {
        (self.routes, self.middlewares)
    }

    fn add_route(
        &mut self,
        method: &str,
        path: &str,
        handler: SharedHandler,
    ) -> Result<(), RegistrationError> {
        let method = parse_method(method)?;
        // The unprefixed path must be well formed on its own
        parse_pattern(path)?;
        let full = format!("{}{path}", self.prefix);
        self.routes.insert(method, &full, handler)?;
        Ok(())
    }
}

impl std::fmt::Debug for Blueprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blueprint")
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .field("routes", &self.routes.len())
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}
