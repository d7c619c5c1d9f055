// Connection handling module
// Serves one TCP connection with hyper and hands each request to the dispatcher

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use http_body_util::{LengthLimitError, Limited};
use hyper::body::{Body, Incoming};
use hyper::header::{HeaderMap, HeaderName, CONTENT_LENGTH, REFERER, USER_AGENT};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{StatusCode, Version};
use hyper_util::rt::TokioIo;

use crate::config::Config;
use crate::dispatcher::Bunwork;
use crate::http::{build_413_response, build_500_response, build_text_response, Request, Response};
use crate::logger::{self, AccessLogEntry};

/// Accept a connection, enforcing `max_connections`, and serve it on its own task.
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    app: &Arc<Bunwork>,
    config: &Arc<Config>,
    conn_counter: &Arc<AtomicUsize>,
) {
    // Increment first, then check, so concurrent accepts cannot both slip under the limit
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection rejected."
            ));
            drop(stream);
            return;
        }
    }

    if config.logging.access_log {
        logger::log_connection_accepted(&peer_addr);
    }

    handle_connection(
        stream,
        peer_addr,
        Arc::clone(app),
        Arc::clone(config),
        Arc::clone(conn_counter),
    );
}

/// Serve HTTP/1.1 on the stream until the client goes away.
///
/// No read or write timeouts are applied.
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    app: Arc<Bunwork>,
    config: Arc<Config>,
    conn_counter: Arc<AtomicUsize>,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let mut builder = http1::Builder::new();
        builder.keep_alive(config.performance.keep_alive);

        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let app = Arc::clone(&app);
                let config = Arc::clone(&config);
                async move { Ok::<_, Infallible>(serve_request(req, peer_addr, &app, &config).await) }
            }),
        );

        if let Err(err) = conn.await {
            logger::log_connection_error(&err);
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}

async fn serve_request(
    req: hyper::Request<Incoming>,
    peer_addr: SocketAddr,
    app: &Bunwork,
    config: &Config,
) -> Response {
    let started = Instant::now();
    let mut entry = config.logging.access_log.then(|| {
        access_entry(
            peer_addr,
            req.method().as_str(),
            req.uri(),
            req.version(),
            req.headers(),
        )
    });

    let response = if let Some(resp) = check_body_size(req.headers(), config.performance.max_body_size) {
        resp
    } else {
        let limit = usize::try_from(config.performance.max_body_size).unwrap_or(usize::MAX);
        let req = req.map(|body| Limited::new(body, limit));
        match Request::from_hyper(req, Some(peer_addr)).await {
            Ok(req) => dispatch(app, req).await,
            Err(e) if e.is::<LengthLimitError>() => {
                logger::log_error(&format!(
                    "Request body exceeded {limit} bytes while reading"
                ));
                build_413_response()
            }
            Err(e) => {
                logger::log_error(&format!("Failed to read request body: {e}"));
                build_text_response(StatusCode::BAD_REQUEST, "Bad Request")
            }
        }
    };

    if let Some(entry) = entry.as_mut() {
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(entry, &config.logging.access_log_format);
    }

    response
}

/// Run the dispatcher; failures raised by user code become a 500
pub async fn dispatch(app: &Bunwork, req: Request) -> Response {
    let method = req.method().clone();
    let path = req.path().to_string();
    match app.handle(req).await {
        Ok(resp) => resp,
        Err(e) => {
            logger::log_error(&format!("{method} {path}: {e}"));
            build_500_response()
        }
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(headers: &HeaderMap, max_body_size: u64) -> Option<Response> {
    let content_length = headers.get(CONTENT_LENGTH)?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

fn access_entry(
    peer_addr: SocketAddr,
    method: &str,
    uri: &hyper::Uri,
    version: Version,
    headers: &HeaderMap,
) -> AccessLogEntry {
    let header = |name: HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        method.to_string(),
        uri.path().to_string(),
    );
    entry.query = uri.query().map(ToString::to_string);
    entry.http_version = version_label(version).to_string();
    entry.referer = header(REFERER);
    entry.user_agent = header(USER_AGENT);
    entry
}

fn version_label(version: Version) -> &'static str {
    if version == Version::HTTP_09 {
        "0.9"
    } else if version == Version::HTTP_10 {
        "1.0"
    } else if version == Version::HTTP_2 {
        "2.0"
    } else if version == Version::HTTP_3 {
        "3.0"
    } else {
        "1.1"
    }
}
