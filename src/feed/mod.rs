//! Feed retrieval.
//!
//! Fetches the configured RSS/Atom feed and exposes its entries as
//! [`RawEntry`] values for the batch pipeline.

mod fetcher;
mod recovery;
mod types;

pub use fetcher::{parse_entries, FeedFetcher, FetchError};
pub use types::{RawEntry, MAX_FEED_SIZE, UNTITLED};
