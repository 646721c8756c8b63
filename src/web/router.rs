//! Router configuration for the HTTP API.

use axum::{routing::get, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{list_news, status, trigger_batch, AppState};
use super::middleware::create_cors_layer;

/// Create the API router.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/trigger-batch", get(trigger_batch).post(trigger_batch))
        .route("/news", get(list_news))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins)),
        )
        .with_state(app_state)
}
