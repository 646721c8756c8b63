//! Response DTOs for Web API.

use serde::Serialize;

use crate::article::Article;
use crate::batch::RunReport;

/// Service status returned by `/`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Always `"running"`.
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
    /// Most recent run, if any.
    pub last_run: Option<RunReport>,
}

/// Result of a manual trigger.
#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    /// Outcome message.
    pub message: String,
    /// Articles persisted by the run.
    pub new_articles_count: usize,
}

/// Article as returned by `/news`.
#[derive(Debug, Serialize)]
pub struct ArticleResponse {
    /// Article ID.
    pub id: i64,
    /// Headline.
    pub title: String,
    /// Source link.
    pub original_url: String,
    /// Summary.
    pub summary: Option<String>,
    /// Publication time (RFC 3339).
    pub published_at: Option<String>,
    /// Insertion time (RFC 3339).
    pub created_at: String,
}

impl From<Article> for ArticleResponse {
    fn from(article: Article) -> Self {
        Self {
            id: article.id,
            title: article.title,
            original_url: article.original_url,
            summary: article.summary,
            published_at: article.published_at.map(|dt| dt.to_rfc3339()),
            created_at: article.created_at.to_rfc3339(),
        }
    }
}
