use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    routing::{any, get},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::middleware::headers::{request_id_middleware, security_headers_middleware};
use crate::AppState;

pub mod handlers;

/// Build the full application router: the token endpoint at `/`, plus
/// health and metrics.
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_body_bytes;

    Router::new()
        .route("/", any(handlers::token_endpoint))
        .route("/healthz", get(|| async { "ok" }))
        .route("/metrics", get(handlers::prometheus_metrics))
        .fallback(fallback_404)
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(middleware::from_fn(security_headers_middleware))
}

async fn fallback_404() -> StatusCode {
    StatusCode::NOT_FOUND
}
