//! Service status and manual trigger handlers.

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::web::dto::{StatusResponse, TriggerQuery, TriggerResponse, MAX_TRIGGER_LIMIT};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Service name reported by the status endpoint.
pub const SERVICE_NAME: &str = "News Batcher";

/// GET / - Service status.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "running",
        service: SERVICE_NAME,
        last_run: state.orchestrator.last_report().await,
    })
}

/// GET|POST /trigger-batch - Run the batch now.
///
/// Waits for the run to finish. A run that aborts on the feed still succeeds
/// with a count of zero; store failures become 500.
pub async fn trigger_batch(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TriggerQuery>,
) -> Result<Json<TriggerResponse>, ApiError> {
    let limit = query.resolve(state.manual_limit).ok_or_else(|| {
        ApiError::bad_request(format!("limit must be between 1 and {MAX_TRIGGER_LIMIT}"))
    })?;

    tracing::info!(limit, "Manual batch triggered");
    let report = state.orchestrator.run_once(limit).await?;

    Ok(Json(TriggerResponse {
        message: "Batch executed successfully".to_string(),
        new_articles_count: report.new_articles,
    }))
}
