//! Article read-back handlers.

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::article::ArticleRepository;
use crate::web::dto::{ArticleResponse, NewsQuery};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// GET /news - Most recent articles.
pub async fn list_news(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NewsQuery>,
) -> Result<Json<Vec<ArticleResponse>>, ApiError> {
    let repo = ArticleRepository::new(state.db.pool());
    let articles = repo.list_recent(query.limit()).await.map_err(|e| {
        tracing::error!("Failed to list articles: {}", e);
        ApiError::internal("Failed to list articles")
    })?;

    Ok(Json(articles.into_iter().map(ArticleResponse::from).collect()))
}
