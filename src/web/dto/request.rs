//! Request DTOs for Web API.

use serde::Deserialize;

use crate::article::{DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};

/// Largest item limit a manual trigger accepts.
pub const MAX_TRIGGER_LIMIT: usize = 100;

/// Query parameters for `/trigger-batch`.
#[derive(Debug, Default, Deserialize)]
pub struct TriggerQuery {
    /// Item limit for this run.
    pub limit: Option<usize>,
}

impl TriggerQuery {
    /// Resolve the limit, falling back to `default`.
    ///
    /// Returns `None` when an explicit limit is outside `1..=MAX_TRIGGER_LIMIT`.
    pub fn resolve(&self, default: usize) -> Option<usize> {
        match self.limit {
            None => Some(default),
            Some(limit) if (1..=MAX_TRIGGER_LIMIT).contains(&limit) => Some(limit),
            Some(_) => None,
        }
    }
}

/// Query parameters for `/news`.
#[derive(Debug, Default, Deserialize)]
pub struct NewsQuery {
    /// Number of articles to return.
    pub limit: Option<i64>,
}

impl NewsQuery {
    /// Effective limit, clamped to `1..=MAX_LIST_LIMIT`.
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT)
    }
}
