//! Axum router for the tool endpoints.
//!
//! `/_health` is open; everything under `/tools` requires the bearer token.

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let tools = Router::new()
        .route("/recent-posts", post(handlers::tools::recent_posts))
        .route(
            "/create-top-level-post",
            post(handlers::tools::create_top_level_post),
        )
        .route(
            "/create-whitewind-post",
            post(handlers::tools::create_whitewind_post),
        );

    Router::new()
        .nest("/tools", tools)
        .route("/_health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /_health - liveness probe (no auth required).
async fn health_check() -> &'static str {
    "healthy"
}
