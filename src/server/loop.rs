// Server loop module
// Accepts connections until a shutdown notification arrives

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use super::connection::accept_connection;
use crate::config::Config;
use crate::dispatcher::Bunwork;
use crate::logger;

/// Run the accept loop.
///
/// Returns once `shutdown` is notified. The listener is dropped on return;
/// connections already handed off keep running on their own tasks and are
/// tracked by `active_connections`.
pub async fn start_server_loop(
    listener: TcpListener,
    app: Arc<Bunwork>,
    config: Arc<Config>,
    active_connections: Arc<AtomicUsize>,
    shutdown: Arc<Notify>,
) {
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &app, &config, &active_connections);
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            () = shutdown.notified() => {
                logger::log_shutdown(active_connections.load(Ordering::SeqCst));
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::HandlerResult;
    use crate::http::{build_text_response, Request};
    use crate::server::create_reusable_listener;
    use hyper::StatusCode;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn test_config() -> Config {
        let mut config = Config::load_from("does-not-exist/bunwork").unwrap();
        config.logging.access_log = false;
        config.performance.keep_alive = false;
        config
    }

    async fn raw_request(addr: std::net::SocketAddr, request: &str) -> String {
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn test_serves_until_shutdown() {
        let mut app = Bunwork::new();
        app.get("/hello/:name", |req: Request| async move {
            let name = req.param("name").unwrap_or_default().to_string();
            HandlerResult::Ok(build_text_response(StatusCode::OK, format!("Hello, {name}!")))
        })
        .unwrap();

        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let server = tokio::spawn(start_server_loop(
            listener,
            Arc::new(app),
            Arc::new(test_config()),
            Arc::new(AtomicUsize::new(0)),
            Arc::clone(&shutdown),
        ));

        let response = raw_request(
            addr,
            "GET /hello/world HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.ends_with("Hello, world!"));

        let response = raw_request(
            addr,
            "GET /missing HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 404 Not Found"));
        assert!(response.ends_with("Not Found"));

        shutdown.notify_one();
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_oversized_body() {
        let mut config = test_config();
        config.performance.max_body_size = 4;

        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let server = tokio::spawn(start_server_loop(
            listener,
            Arc::new(Bunwork::new()),
            Arc::new(config),
            Arc::new(AtomicUsize::new(0)),
            Arc::clone(&shutdown),
        ));

        let response = raw_request(
            addr,
            "POST /upload HTTP/1.1\r\nHost: localhost\r\nContent-Length: 10\r\nConnection: close\r\n\r\n0123456789",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 413"));

        shutdown.notify_one();
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_oversized_chunked_body() {
        let mut config = test_config();
        config.performance.max_body_size = 4;

        let mut app = Bunwork::new();
        app.post("/upload", |req: Request| async move {
            let len = req.body().len();
            HandlerResult::Ok(build_text_response(StatusCode::OK, format!("len={len}")))
        })
        .unwrap();

        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let server = tokio::spawn(start_server_loop(
            listener,
            Arc::new(app),
            Arc::new(config),
            Arc::new(AtomicUsize::new(0)),
            Arc::clone(&shutdown),
        ));

        // No Content-Length: the size is only known while reading
        let response = raw_request(
            addr,
            "POST /upload HTTP/1.1\r\nHost: localhost\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n\
             a\r\n0123456789\r\na\r\n0123456789\r\n0\r\n\r\n",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 413"));

        let response = raw_request(
            addr,
            "POST /upload HTTP/1.1\r\nHost: localhost\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n\
             3\r\nabc\r\n0\r\n\r\n",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.ends_with("len=3"));

        shutdown.notify_one();
        server.await.unwrap();
    }
}
