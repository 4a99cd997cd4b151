use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use quilt_protocol::endpoints;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with all Quilt endpoints.
pub fn build_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.config.max_body_bytes);
    Router::new()
        .route(endpoints::HEALTH, get(handler::health_handler))
        .route(endpoints::INFO, get(handler::info_handler))
        .route(endpoints::PULL, post(handler::pull_handler))
        .route(endpoints::PUSH, post(handler::push_handler))
        .layer(body_limit)
        .with_state(state)
}
