//! # nskv-server
//!
//! The HTTP adapter for the namespaced key-value store core
//! (`nskv-core`). Routing, request/response shapes, and metrics live
//! here; the core has no knowledge of HTTP (spec §6).

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod state;
pub mod types;

use std::time::Instant;

use axum::extract::State;
use axum::http::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Builds the full router: every operation in spec §6, wrapped with
/// CORS, request tracing, and latency/error metrics.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/set", post(handlers::kv::set))
        .route("/get/{key}", get(handlers::kv::get))
        .route("/delete/{key}", delete(handlers::kv::delete))
        .route("/namespaces", get(handlers::namespaces::list_namespaces))
        .route(
            "/namespaces/{ns}/keys",
            get(handlers::namespaces::namespace_size),
        )
        .route(
            "/namespaces/{ns}",
            delete(handlers::namespaces::clear_namespace),
        )
        .route("/stats", get(handlers::admin::stats))
        .route("/health", get(handlers::admin::health))
        .route("/compact", post(handlers::admin::compact))
        .route("/performance", get(handlers::admin::performance))
        .layer(middleware::from_fn_with_state(state.clone(), record_metrics))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Times every request and records it into [`metrics::Metrics`],
/// classifying 5xx responses as errors for the PERFORMANCE endpoint's
/// `error_rate`.
async fn record_metrics(
    State(state): State<AppState>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let response = next.run(request).await;
    let is_error = response.status().is_server_error();
    state.metrics.record_request(start.elapsed(), is_error);
    response
}
