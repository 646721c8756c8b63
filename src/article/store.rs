//! Per-run unit of work for article inserts.

use std::collections::HashSet;

use tracing::debug;

use super::repository::{self, ArticleRepository};
use super::types::NewArticle;
use crate::db::DbPool;
use crate::{BatcherError, Result};

/// Article store backed by the connection pool.
#[derive(Debug, Clone)]
pub struct ArticleStore {
    pool: DbPool,
}

impl ArticleStore {
    /// Create a store over the given pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Start a session for one run.
    pub fn session(&self) -> StoreSession<'_> {
        StoreSession {
            pool: &self.pool,
            staged: Vec::new(),
            staged_urls: HashSet::new(),
        }
    }
}

/// Records staged by one run.
///
/// Nothing touches the database until [`commit`](Self::commit); dropping the
/// session discards everything staged.
pub struct StoreSession<'a> {
    pool: &'a DbPool,
    staged: Vec<NewArticle>,
    staged_urls: HashSet<String>,
}

impl<'a> StoreSession<'a> {
    /// Whether the URL is already stored or staged in this session.
    pub async fn exists(&self, url: &str) -> Result<bool> {
        if self.staged_urls.contains(url) {
            return Ok(true);
        }
        ArticleRepository::new(self.pool).exists_by_url(url).await
    }

    /// Stage an article.
    pub fn add(&mut self, article: NewArticle) {
        self.staged_urls.insert(article.original_url.clone());
        self.staged.push(article);
    }

    /// Number of staged articles.
    pub fn pending_count(&self) -> usize {
        self.staged.len()
    }

    /// Insert every staged article in one transaction.
    ///
    /// Returns the number of articles written. On error the transaction is
    /// rolled back and nothing from this session is persisted.
    pub async fn commit(self) -> Result<usize> {
        if self.staged.is_empty() {
            return Ok(0);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| BatcherError::Database(e.to_string()))?;

        for article in &self.staged {
            // An early return drops `tx`, which rolls it back.
            repository::insert(&mut *tx, article).await?;
        }

        tx.commit()
            .await
            .map_err(|e| BatcherError::Database(e.to_string()))?;

        debug!(count = self.staged.len(), "Committed staged articles");
        Ok(self.staged.len())
    }
}
