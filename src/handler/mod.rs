//! Request handler module
//!
//! Route handlers are plain async functions or closures taking the request by
//! value. Static file serving is the fallback collaborator used when no route
//! matched.

pub mod static_files;

use crate::error::BoxError;
use crate::http::{Request, Response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed, sendable future
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Outcome of a route handler
pub type HandlerResult = Result<Response, BoxError>;

/// Handler shared between the route table and concurrent requests
pub type SharedHandler = Arc<dyn Handler>;

/// Invocable route handler
pub trait Handler: Send + Sync + 'static {
    fn call(&self, req: Request) -> BoxFuture<HandlerResult>;
}

impl<F, Fut> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture<HandlerResult> {
        Box::pin(self(req))
    }
}

pub use static_files::{StaticRoute, StaticRoutes};
