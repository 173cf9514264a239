use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use super::handlers::{health, index, metrics, search, vectors};
use super::AppState;

pub fn build_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.server.request_timeout_secs);
    let body_limit = state.config.server.max_body_bytes;

    Router::new()
        .route("/healthz", get(health::health_check))
        .route("/metrics", get(metrics::metrics_handler))
        .route(
            "/v1/indexes",
            post(index::create_index).get(index::list_indexes),
        )
        .route(
            "/v1/indexes/:name",
            get(index::get_index).delete(index::delete_index),
        )
        .route("/v1/indexes/:name/train", post(index::train_index))
        .route("/v1/indexes/:name/vectors", post(vectors::add_vectors))
        .route("/v1/indexes/:name/search", post(search::search_index))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TimeoutLayer::new(timeout))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
