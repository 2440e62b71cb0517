use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::logging::log_requests;
use crate::AppState;

/// Create file server routes.
///
/// Subpaths are only routed when the root is a directory; a single-file root
/// answers on `/{content_type}` alone.
pub fn file_routes(root_is_dir: bool) -> Router<AppState> {
    let listing = get(handlers::get_root)
        .post(handlers::upload_file)
        .layer(DefaultBodyLimit::disable());

    let router = Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/version", get(handlers::version))
        .route("/content_types", get(handlers::content_types))
        .route("/{content_type}", listing.clone())
        .route("/{content_type}/", listing);

    if root_is_dir {
        router.route("/{content_type}/{*file}", get(handlers::get_path))
    } else {
        router
    }
}

/// The complete application: routes, access log and tracing.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(file_routes(state.root_is_dir))
        .layer(middleware::from_fn(log_requests))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Route table for the startup banner.
pub fn describe(root_is_dir: bool) -> Vec<&'static str> {
    let mut routes = vec![
        "GET  /",
        "GET  /health",
        "GET  /version",
        "GET  /content_types",
        "GET  /{content_type}/",
        "POST /{content_type}/",
    ];
    if root_is_dir {
        routes.push("GET  /{content_type}/{*file}");
    }
    routes
}
