//! Request model
//!
//! A fully buffered view of an inbound HTTP request. Route parameters are
//! attached by the dispatcher after a successful match.

use http_body_util::BodyExt;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderName, HeaderValue};
use hyper::{HeaderMap, Method, Uri, Version};
use std::collections::HashMap;
use std::net::SocketAddr;

/// Named path parameters extracted from a dynamic route
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    inner: HashMap<String, String>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `value`, replacing an earlier binding of the same name
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Inbound request handed to middlewares and route handlers
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
    remote_addr: Option<SocketAddr>,
    params: Option<Params>,
}

impl Request {
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    /// Buffer a hyper request into a `Request`.
    ///
    /// Wrap the body in `http_body_util::Limited` to cap how much is read.
    pub async fn from_hyper<B>(
        req: hyper::Request<B>,
        remote_addr: Option<SocketAddr>,
    ) -> Result<Self, B::Error>
    where
        B: Body<Data = Bytes>,
    {
        let (parts, body) = req.into_parts();
        let body = body.collect().await?.to_bytes();

        Ok(Self {
            method: parts.method,
            uri: parts.uri,
            version: parts.version,
            headers: parts.headers,
            body,
            remote_addr,
            params: None,
        })
    }

    pub const fn method(&self) -> &Method {
        &self.method
    }

    pub const fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    pub const fn version(&self) -> Version {
        self.version
    }

    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Header value as a string, if present and valid ASCII
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    pub const fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// Route parameters, present only after a dynamic route matched
    pub const fn params(&self) -> Option<&Params> {
        self.params.as_ref()
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.as_ref().and_then(|p| p.get(name))
    }

    /// Merge route parameters into the request without touching anything else
    pub(crate) fn attach_params(&mut self, params: Params) {
        match &mut self.params {
            Some(existing) => existing.inner.extend(params.inner),
            None => self.params = Some(params),
        }
    }
}

/// Builder for requests created outside of a live connection
#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
    remote_addr: Option<SocketAddr>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self {
            method: Method::GET,
            uri: Uri::from_static("/"),
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            remote_addr: None,
        }
    }
}

impl RequestBuilder {
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set the request target; an unparsable URI leaves the previous one
    #[must_use]
    pub fn uri(mut self, uri: &str) -> Self {
        if let Ok(parsed) = uri.parse::<Uri>() {
            self.uri = parsed;
        }
        self
    }

    /// Add a header; an invalid name or value is skipped
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub const fn remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    pub fn build(self) -> Request {
        Request {
            method: self.method,
            uri: self.uri,
            version: self.version,
            headers: self.headers,
            body: self.body,
            remote_addr: self.remote_addr,
            params: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let req = Request::builder().build();
        assert_eq!(*req.method(), Method::GET);
        assert_eq!(req.path(), "/");
        assert!(req.params().is_none());
        assert!(req.body().is_empty());
    }

    #[test]
    fn test_path_and_query() {
        let req = Request::builder().uri("/search/books?page=2").build();
        assert_eq!(req.path(), "/search/books");
        assert_eq!(req.query(), Some("page=2"));
    }

    #[test]
    fn test_attach_params_keeps_existing() {
        let mut req = Request::builder()
            .header("x-trace", "abc")
            .body("payload")
            .build();

        let mut first = Params::new();
        first.insert("id", "1");
        req.attach_params(first);

        let mut second = Params::new();
        second.insert("name", "john");
        req.attach_params(second);

        assert_eq!(req.param("id"), Some("1"));
        assert_eq!(req.param("name"), Some("john"));
        assert_eq!(req.header("x-trace"), Some("abc"));
        assert_eq!(req.body().as_ref(), b"payload");
    }

    #[test]
    fn test_builder_header_names() {
        let req = Request::builder()
            .header("X-Trace", "abc")
            .header("bad name", "skipped")
            .header("x-bad-value", "line\nbreak")
            .build();

        assert_eq!(req.header("x-trace"), Some("abc"));
        assert_eq!(req.headers().len(), 1);
    }

    #[tokio::test]
    async fn test_from_hyper_respects_body_limit() {
        use http_body_util::{Full, Limited};

        let hyper_req = hyper::Request::builder()
            .method(Method::POST)
            .uri("/upload?x=1")
            .body(Limited::new(Full::new(Bytes::from_static(b"1234")), 4))
            .unwrap();
        let req = Request::from_hyper(hyper_req, None).await.unwrap();
        assert_eq!(req.path(), "/upload");
        assert_eq!(req.body().as_ref(), b"1234");

        let hyper_req = hyper::Request::builder()
            .body(Limited::new(Full::new(Bytes::from_static(b"12345")), 4))
            .unwrap();
        let err = Request::from_hyper(hyper_req, None).await.err().unwrap();
        assert!(err.is::<http_body_util::LengthLimitError>());
    }
}
