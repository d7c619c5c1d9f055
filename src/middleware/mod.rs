//! Middleware pipeline
//!
//! Middlewares run strictly one after another in registration order, before
//! any routing happens. Each receives a [`Next`] token; a middleware that
//! completes without calling [`Next::proceed`] halts the pipeline.

mod chain;

pub use chain::{Flow, MiddlewareChain};

use crate::error::BoxError;
use crate::http::Request;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Continuation signal handed to each middleware
#[derive(Debug)]
pub struct Next {
    signal: Arc<AtomicBool>,
}

impl Next {
    /// Create a token and the flag it sets
    fn pair() -> (Self, Arc<AtomicBool>) {
        let signal = Arc::new(AtomicBool::new(false));
        (
            Self {
                signal: Arc::clone(&signal),
            },
            signal,
        )
    }

    /// Let the request continue to the next middleware and routing
    pub fn proceed(self) {
        self.signal.store(true, Ordering::Release);
    }
}

/// Request interceptor
#[async_trait]
pub trait Middleware: Send + Sync + 'static {
    async fn handle(&self, req: &mut Request, next: Next) -> Result<(), BoxError>;
}

/// Middleware backed by a synchronous closure, see [`from_fn`]
pub struct FnMiddleware<F> {
    f: F,
}

/// Wrap a synchronous closure as a middleware
///
/// ```
/// use bunwork::middleware::{from_fn, Next};
/// use bunwork::http::Request;
///
/// let only_get = from_fn(|req: &mut Request, next: Next| {
///     if *req.method() == hyper::Method::GET {
///         next.proceed();
///     }
///     Ok(())
/// });
/// # let _ = only_get;
/// ```
pub const fn from_fn<F>(f: F) -> FnMiddleware<F>
where
    F: Fn(&mut Request, Next) -> Result<(), BoxError> + Send + Sync + 'static,
{
    FnMiddleware { f }
}

#[async_trait]
impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(&mut Request, Next) -> Result<(), BoxError> + Send + Sync + 'static,
{
    async fn handle(&self, req: &mut Request, next: Next) -> Result<(), BoxError> {
        (self.f)(req, next)
    }
}
