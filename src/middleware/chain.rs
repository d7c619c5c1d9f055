use super::{Middleware, Next};
use crate::error::BoxError;
use crate::http::Request;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Outcome of running the middleware pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Blocked,
}

/// Ordered, append-only list of middlewares
#[derive(Default, Clone)]
pub struct MiddlewareChain {
    middleware_stack: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, middleware: Arc<dyn Middleware>) {
        self.middleware_stack.push(middleware);
    }

    /// Append every middleware of `other`, keeping its order
    pub fn append(&mut self, other: Self) {
        self.middleware_stack.extend(other.middleware_stack);
    }

    /// Run each middleware to completion in order.
    ///
    /// Stops at the first one that did not signal continuation. Errors are
    /// returned as-is and also stop the pipeline.
    pub async fn run(&self, req: &mut Request) -> Result<Flow, BoxError> {
        for middleware in &self.middleware_stack {
            let (next, signal) = Next::pair();
            middleware.handle(req, next).await?;
            if !signal.load(Ordering::Acquire) {
                return Ok(Flow::Blocked);
            }
        }
        Ok(Flow::Continue)
    }

    pub fn len(&self) -> usize {
        self.middleware_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middleware_stack.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::from_fn;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str, pass: bool) -> Arc<dyn Middleware> {
        let log = Arc::clone(log);
        Arc::new(from_fn(move |_req: &mut Request, next: Next| {
            log.lock().unwrap().push(name);
            if pass {
                next.proceed();
            }
            Ok(())
        }))
    }

    /// Signals continuation only after a suspension point
    struct Delayed {
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl Middleware for Delayed {
        async fn handle(&self, _req: &mut Request, next: Next) -> Result<(), BoxError> {
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.log.lock().unwrap().push("delayed");
            next.proceed();
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_runs_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = MiddlewareChain::new();
        chain.push(recorder(&log, "first", true));
        chain.push(recorder(&log, "second", true));

        let mut req = Request::builder().build();
        assert_eq!(chain.run(&mut req).await.unwrap(), Flow::Continue);
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_blocking_skips_rest() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = MiddlewareChain::new();
        chain.push(recorder(&log, "gate", false));
        chain.push(recorder(&log, "never", true));

        let mut req = Request::builder().build();
        assert_eq!(chain.run(&mut req).await.unwrap(), Flow::Blocked);
        assert_eq!(*log.lock().unwrap(), vec!["gate"]);
    }

    #[tokio::test]
    async fn test_waits_for_async_middleware() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = MiddlewareChain::new();
        chain.push(Arc::new(Delayed {
            log: Arc::clone(&log),
        }));
        chain.push(recorder(&log, "after", true));

        let mut req = Request::builder().build();
        assert_eq!(chain.run(&mut req).await.unwrap(), Flow::Continue);
        assert_eq!(*log.lock().unwrap(), vec!["delayed", "after"]);
    }

    #[tokio::test]
    async fn test_error_propagates() {
        let mut chain = MiddlewareChain::new();
        chain.push(Arc::new(from_fn(|_req: &mut Request, _next: Next| {
            Err("token store unavailable".into())
        })));

        let mut req = Request::builder().build();
        let err = chain.run(&mut req).await.unwrap_err();
        assert_eq!(err.to_string(), "token store unavailable");
    }

    #[tokio::test]
    async fn test_middleware_can_decorate_request() {
        let mut chain = MiddlewareChain::new();
        chain.push(Arc::new(from_fn(|req: &mut Request, next: Next| {
            req.headers_mut()
                .insert("x-request-id", hyper::header::HeaderValue::from_static("r-1"));
            next.proceed();
            Ok(())
        })));

        let mut req = Request::builder().build();
        chain.run(&mut req).await.unwrap();
        assert_eq!(req.header("x-request-id"), Some("r-1"));
    }

    #[tokio::test]
    async fn test_append_keeps_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut global = MiddlewareChain::new();
        global.push(recorder(&log, "global", true));

        let mut group = MiddlewareChain::new();
        group.push(recorder(&log, "a", true));
        group.push(recorder(&log, "b", true));

        global.append(group);
        assert_eq!(global.len(), 3);

        let mut req = Request::builder().build();
        global.run(&mut req).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["global", "a", "b"]);
    }
}
