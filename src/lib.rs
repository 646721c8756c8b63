//! News Batcher
//!
//! Pulls a news RSS feed once a day, summarizes each new article with a
//! generation API, stores the results in SQLite, and serves them over HTTP.

pub mod article;
pub mod batch;
pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod feed;
pub mod logging;
pub mod summarizer;
pub mod web;

pub use article::{Article, ArticleRepository, ArticleStore, NewArticle, StoreSession};
pub use batch::{BatchScheduler, Orchestrator, RunPhase, RunReport};
pub use config::Config;
pub use db::{Database, DbPool};
pub use error::{BatcherError, Result};
pub use feed::{FeedFetcher, FetchError, RawEntry};
pub use summarizer::{GenerationError, Summarizer};
pub use web::WebServer;
