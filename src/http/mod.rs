//! HTTP protocol layer module
//!
//! Request and response types shared by the dispatcher, handlers and the
//! connection layer.

pub mod mime;
pub mod request;
pub mod response;

pub use request::{Params, Request, RequestBuilder};
pub use response::{
    build_404_response, build_413_response, build_500_response, build_blocked_response,
    build_file_not_found_response, build_html_response, build_json_response,
    build_text_response, Response,
};
