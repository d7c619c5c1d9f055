//! Static file serving module
//!
//! Maps URL prefixes to directories. Consulted by the dispatcher only after
//! no registered route matched. Every read failure, including an attempt to
//! escape the directory, collapses into the same 404 response.

use crate::http::mime::content_type_for;
use crate::http::response::{build_file_not_found_response, build_file_response};
use crate::http::Response;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// One `prefix -> directory` mapping
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StaticRoute {
    pub prefix: String,
    pub dir: PathBuf,
}

/// Static routes checked in registration order
#[derive(Debug, Clone, Default)]
pub struct StaticRoutes {
    routes: Vec<StaticRoute>,
}

impl StaticRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, prefix: impl Into<String>, dir: impl Into<PathBuf>) {
        self.routes.push(StaticRoute {
            prefix: prefix.into(),
            dir: dir.into(),
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &StaticRoute> {
        self.routes.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Serve `path` from the first route whose prefix it starts with.
    ///
    /// Returns `None` when no prefix applies. Once a prefix applies the answer
    /// is either the file or a "File Not Found" 404.
    pub async fn serve(&self, path: &str) -> Option<Response> {
        let route = self
            .routes
            .iter()
            .find(|r| path.starts_with(r.prefix.as_str()))?;
        let relative = &path[route.prefix.len()..];

        let response = match load_file(&route.dir, relative).await {
            Some((content, content_type)) => build_file_response(content, content_type),
            None => build_file_not_found_response(),
        };
        Some(response)
    }
}

/// Read `relative` inside `dir`, refusing anything that resolves outside it
async fn load_file(dir: &Path, relative: &str) -> Option<(Vec<u8>, &'static str)> {
    let relative = relative.trim_start_matches('/');

    let root = fs::canonicalize(dir).await.ok()?;
    // Missing files fail here; that is the common 404 and is not logged
    let file_path = fs::canonicalize(root.join(relative)).await.ok()?;

    // Traversal outside the root is refused silently, like a missing file
    if !file_path.starts_with(&root) {
        return None;
    }

    let content = fs::read(&file_path).await.ok()?;
    Some((content, content_type_for(&file_path)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response::FILE_NOT_FOUND_BODY;
    use http_body_util::BodyExt;
    use hyper::StatusCode;

    async fn body_string(resp: Response) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    fn site() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("public/css")).unwrap();
        std::fs::write(dir.path().join("public/index.html"), "<h1>home</h1>").unwrap();
        std::fs::write(dir.path().join("public/css/site.css"), "body{}").unwrap();
        std::fs::write(dir.path().join("secret.txt"), "top secret").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_serves_file_under_prefix() {
        let tmp = site();
        let mut routes = StaticRoutes::new();
        routes.add("/static", tmp.path().join("public"));

        let resp = routes.serve("/static/css/site.css").await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "text/css; charset=utf-8");
        assert_eq!(body_string(resp).await, "body{}");
    }

    #[tokio::test]
    async fn test_missing_file_is_file_not_found() {
        let tmp = site();
        let mut routes = StaticRoutes::new();
        routes.add("/static", tmp.path().join("public"));

        let resp = routes.serve("/static/nope.js").await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_string(resp).await, FILE_NOT_FOUND_BODY);

        // A directory is not a readable file
        let resp = routes.serve("/static/css").await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_traversal_is_file_not_found() {
        let tmp = site();
        let mut routes = StaticRoutes::new();
        routes.add("/static", tmp.path().join("public"));

        let resp = routes.serve("/static/../secret.txt").await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_string(resp).await, FILE_NOT_FOUND_BODY);
    }

    #[tokio::test]
    async fn test_unmatched_prefix_is_none() {
        let tmp = site();
        let mut routes = StaticRoutes::new();
        routes.add("/static", tmp.path().join("public"));

        assert!(routes.serve("/assets/index.html").await.is_none());
        assert!(StaticRoutes::new().serve("/static/index.html").await.is_none());
    }

    #[tokio::test]
    async fn test_first_matching_prefix_decides() {
        let tmp = site();
        let mut routes = StaticRoutes::new();
        routes.add("/", tmp.path().join("public/css"));
        routes.add("/static", tmp.path().join("public"));

        // "/" claims the request first, and index.html is not in css/
        let resp = routes.serve("/static/index.html").await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
