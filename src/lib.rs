//! Bunwork: a small HTTP request dispatcher.
//!
//! Routes are matched per method against a segment trie where literal
//! segments win over `:param` segments. Middlewares run in order before
//! routing and can halt a request with a 403. Blueprints bundle routes and
//! middlewares under a prefix and are merged into the dispatcher before it
//! starts serving. Requests no route claims fall back to static directories,
//! then to a 404.
//!
//! ```
//! use bunwork::{Bunwork, HandlerResult, Request};
//! use bunwork::http::build_text_response;
//! use hyper::StatusCode;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let mut app = Bunwork::new();
//! app.get("/hello/:name", |req: Request| async move {
//!     let name = req.param("name").unwrap_or_default().to_string();
//!     HandlerResult::Ok(build_text_response(StatusCode::OK, format!("Hello, {name}!")))
//! })
//! .unwrap();
//!
//! let resp = app.handle(Request::builder().uri("/hello/world").build()).await.unwrap();
//! assert_eq!(resp.status(), StatusCode::OK);
//! # });
//! ```

pub mod blueprint;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod middleware;
pub mod routing;
pub mod server;

pub use blueprint::Blueprint;
pub use dispatcher::Bunwork;
pub use error::{BoxError, DispatchError, RegistrationError};
pub use handler::HandlerResult;
pub use http::{Params, Request, Response};
pub use middleware::{from_fn, Middleware, Next};
