//! Article repository.

use chrono::Utc;
use sqlx::SqliteConnection;

use super::types::{Article, NewArticle, MAX_LIST_LIMIT};
use crate::datetime::{from_db_string, to_db_string};
use crate::db::DbPool;
use crate::{BatcherError, Result};

/// Row type for articles from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ArticleRow {
    id: i64,
    title: String,
    original_url: String,
    summary: Option<String>,
    published_at: Option<String>,
    created_at: String,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        Article {
            id: row.id,
            title: row.title,
            original_url: row.original_url,
            summary: row.summary,
            published_at: row.published_at.and_then(|s| from_db_string(&s)),
            created_at: from_db_string(&row.created_at).unwrap_or_else(Utc::now),
        }
    }
}

/// Repository for article reads.
///
/// Writes go through [`ArticleStore`](super::ArticleStore) sessions, except
/// for the single-row [`create`](Self::create).
pub struct ArticleRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> ArticleRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Whether an article with this exact URL is already stored.
    pub async fn exists_by_url(&self, url: &str) -> Result<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT id FROM news_articles WHERE original_url = $1 LIMIT 1")
                .bind(url)
                .fetch_optional(self.pool)
                .await
                .map_err(|e| BatcherError::Database(e.to_string()))?;

        Ok(found.is_some())
    }

    /// Insert a single article outside of a session.
    ///
    /// Ingestion writes through [`ArticleStore`](crate::ArticleStore); this is
    /// a helper for seeding tests.
    #[doc(hidden)]
    pub async fn create(&self, article: &NewArticle) -> Result<Article> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| BatcherError::Database(e.to_string()))?;
        let id = insert(&mut *conn, article).await?;
        drop(conn);

        self.get_by_id(id)
            .await?
            .ok_or_else(|| BatcherError::NotFound("article".into()))
    }

    /// Get an article by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Article>> {
        let row = sqlx::query_as::<_, ArticleRow>(
            r#"
            SELECT id, title, original_url, summary, published_at, created_at
            FROM news_articles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| BatcherError::Database(e.to_string()))?;

        Ok(row.map(Article::from))
    }

    /// List the most recently published articles.
    ///
    /// Ties on `published_at` are broken by newest ID. `limit` is clamped to
    /// `1..=MAX_LIST_LIMIT`.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<Article>> {
        let limit = limit.clamp(1, MAX_LIST_LIMIT);
        let rows = sqlx::query_as::<_, ArticleRow>(
            r#"
            SELECT id, title, original_url, summary, published_at, created_at
            FROM news_articles
            ORDER BY published_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await
        .map_err(|e| BatcherError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Article::from).collect())
    }

    /// Count all articles.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM news_articles")
            .fetch_one(self.pool)
            .await
            .map_err(|e| BatcherError::Database(e.to_string()))?;

        Ok(count)
    }

    /// Count articles with this exact URL. Test helper for asserting no
    /// duplicate rows were written.
    #[doc(hidden)]
    pub async fn count_by_url(&self, url: &str) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM news_articles WHERE original_url = $1")
                .bind(url)
                .fetch_one(self.pool)
                .await
                .map_err(|e| BatcherError::Database(e.to_string()))?;

        Ok(count)
    }
}

/// Insert one article on an existing connection or transaction, returning its ID.
pub(crate) async fn insert(conn: &mut SqliteConnection, article: &NewArticle) -> Result<i64> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO news_articles (title, original_url, summary, published_at)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(&article.title)
    .bind(&article.original_url)
    .bind(&article.summary)
    .bind(to_db_string(&article.published_at))
    .fetch_one(conn)
    .await
    .map_err(|e| BatcherError::Database(e.to_string()))?;

    Ok(id)
}
