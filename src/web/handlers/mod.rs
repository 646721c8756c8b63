//! API handlers.

pub mod batch;
pub mod news;
pub mod state;

pub use batch::*;
pub use news::*;
pub use state::AppState;
