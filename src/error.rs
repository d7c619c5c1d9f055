//! Error types
//!
//! Registration errors are reported synchronously to the caller of the
//! registration method. Dispatch errors carry failures raised by user
//! handlers and middlewares out of `Bunwork::handle`.

use thiserror::Error;

/// Boxed error returned by handlers and middlewares
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Malformed route or middleware registration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("HTTP method must not be empty")]
    EmptyMethod,

    #[error("invalid HTTP method: {0}")]
    InvalidMethod(String),

    #[error("route path must not be empty")]
    EmptyPath,

    #[error("route path must start with '/': {0}")]
    MissingLeadingSlash(String),

    #[error("parameter segment without a name in route: {0}")]
    EmptyParamName(String),
}

/// Failure raised by user code while handling a request
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("middleware failed: {0}")]
    Middleware(#[source] BoxError),

    #[error("route handler failed: {0}")]
    Handler(#[source] BoxError),
}
