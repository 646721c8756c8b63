//! Error types for the news batcher.

use thiserror::Error;

use crate::feed::FetchError;

/// Common error type for the news batcher.
#[derive(Error, Debug)]
pub enum BatcherError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Feed retrieval error.
    #[error("feed error: {0}")]
    Feed(#[from] FetchError),

    /// Summarizer construction error.
    #[error("summarizer error: {0}")]
    Summarizer(String),

    /// Scheduler error.
    #[error("scheduler error: {0}")]
    Scheduler(String),
}

impl From<sqlx::Error> for BatcherError {
    fn from(e: sqlx::Error) -> Self {
        BatcherError::Database(e.to_string())
    }
}

impl From<tokio_cron_scheduler::JobSchedulerError> for BatcherError {
    fn from(e: tokio_cron_scheduler::JobSchedulerError) -> Self {
        BatcherError::Scheduler(e.to_string())
    }
}

/// Result type alias for news batcher operations.
pub type Result<T> = std::result::Result<T, BatcherError>;
