//! News articles: storage types, read repository, and per-run store sessions.

mod repository;
mod store;
mod types;

pub use repository::ArticleRepository;
pub use store::{ArticleStore, StoreSession};
pub use types::{Article, NewArticle, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
