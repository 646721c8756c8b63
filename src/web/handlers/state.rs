//! Shared handler state.

use std::sync::Arc;

use crate::batch::Orchestrator;
use crate::Database;

/// Application state shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database handle for read-back queries.
    pub db: Database,
    /// Run orchestrator shared with the scheduler.
    pub orchestrator: Arc<Orchestrator>,
    /// Item limit used when a trigger gives none.
    pub manual_limit: usize,
}

impl AppState {
    /// Create a new application state.
    pub fn new(db: Database, orchestrator: Arc<Orchestrator>, manual_limit: usize) -> Self {
        Self {
            db,
            orchestrator,
            manual_limit,
        }
    }
}
