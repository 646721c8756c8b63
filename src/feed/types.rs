//! Feed types.

/// Maximum feed size in bytes (5MB).
pub const MAX_FEED_SIZE: u64 = 5 * 1024 * 1024;

/// Title used for entries that carry none.
pub const UNTITLED: &str = "Untitled";

/// One entry of the fetched feed, in feed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    /// Entry title (never empty).
    pub title: String,
    /// Canonical link of the entry; empty when the feed gave none.
    pub link: String,
    /// Raw publication date; empty when absent.
    pub published: String,
    /// Summary/description snippet; empty when absent.
    pub snippet: String,
}

impl RawEntry {
    /// Create an entry with a title and link.
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            title: if title.trim().is_empty() {
                UNTITLED.to_string()
            } else {
                title
            },
            link: link.into(),
            published: String::new(),
            snippet: String::new(),
        }
    }

    /// Set the raw publication date.
    pub fn with_published(mut self, published: impl Into<String>) -> Self {
        self.published = published.into();
        self
    }

    /// Set the snippet.
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    /// Whether the entry has a usable link.
    pub fn has_link(&self) -> bool {
        !self.link.trim().is_empty()
    }
}
