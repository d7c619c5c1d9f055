//! Route table
//!
//! One trie per HTTP method. Registration replaces an existing handler at the
//! identical pattern; lookup walks the request path one segment at a time with
//! literal segments preferred over parameters.

use super::node::RouteNode;
use super::pattern::{parse_pattern, render, split_path};
use crate::error::RegistrationError;
use crate::handler::SharedHandler;
use crate::http::Params;
use hyper::Method;
use std::collections::HashMap;

/// Successful lookup: the handler and the parameters bound on the way
pub struct RouteMatch<'a> {
    pub handler: &'a SharedHandler,
    pub params: Params,
}

/// A registered route as listed by [`RouteTable::routes`]
#[derive(Clone)]
pub struct RouteEntry {
    pub method: Method,
    pub pattern: String,
    pub handler: SharedHandler,
}

impl std::fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteEntry")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct RouteTable {
    roots: HashMap<Method, RouteNode>,
    len: usize,
}

/// Parse a method name as given at registration (case-insensitive)
pub fn parse_method(method: &str) -> Result<Method, RegistrationError> {
    let method = method.trim();
    if method.is_empty() {
        return Err(RegistrationError::EmptyMethod);
    }
    Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| RegistrationError::InvalidMethod(method.to_string()))
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `method` and `pattern`.
    ///
    /// Returns `true` when an earlier handler at the same pattern was replaced.
    pub fn insert(
        &mut self,
        method: Method,
        pattern: &str,
        handler: SharedHandler,
    ) -> Result<bool, RegistrationError> {
        let segments = parse_pattern(pattern)?;
        let replaced = self
            .roots
            .entry(method)
            .or_default()
            .insert(&segments, handler)
            .is_some();
        if !replaced {
            self.len += 1;
        }
        Ok(replaced)
    }

    /// Find the handler for a concrete request path
    pub fn find(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        let root = self.roots.get(method)?;
        let segments: Vec<&str> = split_path(path).collect();

        let mut bindings = Vec::new();
        let handler = root.find(&segments, &mut bindings)?;

        let mut params = Params::new();
        for (name, value) in bindings {
            params.insert(name, value);
        }
        Some(RouteMatch { handler, params })
    }

    /// All registered routes, sorted by method then pattern
    pub fn routes(&self) -> Vec<RouteEntry> {
        let mut entries = Vec::with_capacity(self.len);
        for (method, root) in &self.roots {
            let mut found = Vec::new();
            root.collect("", &mut found);
            entries.extend(found.into_iter().map(|(pattern, handler)| RouteEntry {
                method: method.clone(),
                pattern,
                handler,
            }));
        }
        entries.sort_by(|a, b| {
            a.method
                .as_str()
                .cmp(b.method.as_str())
                .then_with(|| a.pattern.cmp(&b.pattern))
        });
        entries
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Canonical form of a pattern, as it appears in route listings
pub fn canonical_pattern(pattern: &str) -> Result<String, RegistrationError> {
    parse_pattern(pattern).map(|segments| render(&segments))
}
