use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use bunwork::config::Config;
use bunwork::http::{build_html_response, build_json_response, build_text_response};
use bunwork::server::{create_reusable_listener, signal, start_server_loop};
use bunwork::{from_fn, logger, Blueprint, Bunwork, HandlerResult, Next, RegistrationError, Request};
use hyper::header::HeaderValue;
use hyper::StatusCode;
use serde::Serialize;
use tokio::sync::Notify;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::load()?;

    // Size the runtime from the workers setting, defaulting to CPU cores
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    logger::init(&cfg)?;

    let addr = cfg.socket_addr()?;
    let app = build_app(&cfg)?;

    let static_routes: Vec<(String, String)> = app
        .static_routes()
        .iter()
        .map(|r| (r.prefix.clone(), r.dir.display().to_string()))
        .collect();
    logger::log_routes(&app.routes(), &static_routes);

    let listener = create_reusable_listener(addr)?;
    logger::log_server_start(&addr, &cfg);

    let shutdown = Arc::new(Notify::new());
    signal::start_signal_handler(Arc::clone(&shutdown))?;

    // Registration is over: from here on the dispatcher is shared read-only
    start_server_loop(
        listener,
        Arc::new(app),
        Arc::new(cfg),
        Arc::new(AtomicUsize::new(0)),
        shutdown,
    )
    .await;
    Ok(())
}

fn build_app(cfg: &Config) -> Result<Bunwork, RegistrationError> {
    let mut app = Bunwork::new();

    app.use_middleware(from_fn(|req: &mut Request, next: Next| {
        if !req.path().starts_with("/admin") {
            next.proceed();
        }
        Ok(())
    }));

    app.get("/", |_req: Request| async {
        HandlerResult::Ok(build_html_response(
            StatusCode::OK,
            "<h1>Bunwork</h1><p>Try <a href=\"/hello/world\">/hello/world</a></p>",
        ))
    })?;
    app.get("/hello/:name", hello)?;

    app.register_blueprint(users_blueprint()?)?;

    for route in &cfg.static_routes {
        app.static_route(route.prefix.clone(), route.dir.clone());
    }

    Ok(app)
}

async fn hello(req: Request) -> HandlerResult {
    let name = req.param("name").unwrap_or("stranger");
    Ok(build_text_response(StatusCode::OK, format!("Hello, {name}!")))
}

#[derive(Serialize)]
struct User {
    id: String,
    name: String,
}

fn users_blueprint() -> Result<Blueprint, RegistrationError> {
    let mut users = Blueprint::new("users", "/users");

    // Tag user API requests so handlers downstream can tell them apart
    users.use_middleware(from_fn(|req: &mut Request, next: Next| {
        if req.path().starts_with("/users") {
            req.headers_mut()
                .insert("x-bunwork-blueprint", HeaderValue::from_static("users"));
        }
        next.proceed();
        Ok(())
    }));

    users
        .get("/", |_req: Request| async {
            let all = vec![
                User {
                    id: "1".to_string(),
                    name: "ada".to_string(),
                },
                User {
                    id: "2".to_string(),
                    name: "grace".to_string(),
                },
            ];
            HandlerResult::Ok(build_json_response(StatusCode::OK, &all))
        })?
        .get("/:id", |req: Request| async move {
            let user = User {
                id: req.param("id").unwrap_or_default().to_string(),
                name: "unknown".to_string(),
            };
            HandlerResult::Ok(build_json_response(StatusCode::OK, &user))
        })?
        .post("/", |req: Request| async move {
            let size = req.body().len();
            HandlerResult::Ok(build_text_response(
                StatusCode::CREATED,
                format!("created user from {size} byte payload"),
            ))
        })?;

    Ok(users)
}
