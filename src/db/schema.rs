//! Database schema and migrations.
//!
//! Migrations are applied in order when the database is opened; the
//! `schema_version` table records which ones have run.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: news articles
    r#"
CREATE TABLE news_articles (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    title         TEXT NOT NULL,
    original_url  TEXT NOT NULL,
    summary       TEXT,
    published_at  TEXT,
    created_at    TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Not UNIQUE: duplicates are filtered before insert.
CREATE INDEX idx_news_articles_original_url ON news_articles(original_url);
CREATE INDEX idx_news_articles_published_at ON news_articles(published_at);
"#,
];
