//! Article types.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Default number of articles returned by a listing.
pub const DEFAULT_LIST_LIMIT: i64 = 10;

/// Maximum number of articles returned by a listing.
pub const MAX_LIST_LIMIT: i64 = 100;

/// A persisted news article.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    /// Article ID.
    pub id: i64,
    /// Headline.
    pub title: String,
    /// Link to the source article.
    pub original_url: String,
    /// Generated summary, or a placeholder/error string.
    pub summary: Option<String>,
    /// Publication time (UTC).
    pub published_at: Option<DateTime<Utc>>,
    /// When the row was inserted.
    pub created_at: DateTime<Utc>,
}

/// An article staged for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewArticle {
    /// Headline.
    pub title: String,
    /// Link to the source article.
    pub original_url: String,
    /// Summary text.
    pub summary: String,
    /// Publication time (UTC).
    pub published_at: DateTime<Utc>,
}

impl NewArticle {
    /// Create a new article.
    pub fn new(
        title: impl Into<String>,
        original_url: impl Into<String>,
        summary: impl Into<String>,
        published_at: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            original_url: original_url.into(),
            summary: summary.into(),
            published_at,
        }
    }
}
