//! Feed fetcher.
//!
//! Retrieves the configured RSS/Atom feed and turns it into an ordered list
//! of [`RawEntry`] values.

use std::time::Duration;

use feed_rs::model::Entry;
use feed_rs::parser;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::config::FeedConfig;
use crate::feed::recovery::recover_entries;
use crate::feed::types::RawEntry;
use crate::{BatcherError, Result};

/// Browser-like request headers; some news sources reject obvious bots.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
const ACCEPT: &str = "application/rss+xml,application/atom+xml,application/xml;q=0.9,\
                      text/html;q=0.8,*/*;q=0.7";
const ACCEPT_LANGUAGE: &str = "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7";
const REFERER: &str = "https://www.google.com/";

/// Feed retrieval failure.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, timeout, connection reset, body read).
    #[error("failed to fetch feed: {0}")]
    Request(#[from] reqwest::Error),
    /// Non-2xx response.
    #[error("HTTP error: {0}")]
    HttpStatus(StatusCode),
    /// Body exceeds the configured size limit.
    #[error("feed too large: {0} bytes (max {1} bytes)")]
    TooLarge(u64, u64),
    /// The document yielded no entries.
    #[error("feed contained no entries")]
    Empty,
}

impl FetchError {
    /// Whether this is a network or HTTP failure rather than an empty feed.
    pub fn is_network_or_http(&self) -> bool {
        !matches!(self, FetchError::Empty)
    }
}

/// Fetcher bound to a single feed URL.
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: Client,
    url: String,
    max_feed_size: u64,
    max_snippet_length: usize,
}

impl FeedFetcher {
    /// Create a fetcher from the feed configuration.
    pub fn new(config: &FeedConfig) -> Result<Self> {
        let client = Client::builder()
            .default_headers(browser_headers())
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| BatcherError::Feed(FetchError::Request(e)))?;

        Ok(Self {
            client,
            url: config.url.clone(),
            max_feed_size: config.max_feed_size_bytes,
            max_snippet_length: config.max_snippet_length,
        })
    }

    /// The feed URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch and parse the feed.
    ///
    /// A malformed document keeps whatever entries can be recovered from it;
    /// only a document yielding none surfaces as [`FetchError::Empty`].
    pub async fn fetch(&self) -> std::result::Result<Vec<RawEntry>, FetchError> {
        debug!(url = %self.url, "Fetching feed");

        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_feed_size {
                return Err(FetchError::TooLarge(content_length, self.max_feed_size));
            }
        }

        let bytes = response.bytes().await?;
        if bytes.len() as u64 > self.max_feed_size {
            return Err(FetchError::TooLarge(bytes.len() as u64, self.max_feed_size));
        }

        let entries = parse_entries(&bytes, self.max_snippet_length);
        if entries.is_empty() {
            warn!(url = %self.url, "No entries found in feed");
            return Err(FetchError::Empty);
        }

        debug!(url = %self.url, count = entries.len(), "Feed fetched");
        Ok(entries)
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
    headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT));
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static(ACCEPT_LANGUAGE),
    );
    headers.insert(header::REFERER, HeaderValue::from_static(REFERER));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );
    headers
}

/// Parse feed bytes into entries, in document order.
///
/// A document the parser rejects is a bozo feed: the failure is logged and
/// the entries that can still be recovered from it are returned.
pub fn parse_entries(bytes: &[u8], max_snippet_length: usize) -> Vec<RawEntry> {
    let entries = match parser::parse(bytes) {
        Ok(feed) => feed.entries,
        Err(e) => {
            warn!("Feed document is malformed, recovering what parses: {}", e);
            let recovered = recover_entries(&String::from_utf8_lossy(bytes));
            if !recovered.is_empty() {
                warn!(count = recovered.len(), "Recovered entries from malformed feed");
            }
            recovered
        }
    };

    entries
        .into_iter()
        .map(|entry| entry_from_feed(entry, max_snippet_length))
        .collect()
}

fn entry_from_feed(entry: Entry, max_snippet_length: usize) -> RawEntry {
    let title = entry.title.map(|t| t.content).unwrap_or_default();
    let link = entry
        .links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .or_else(|| entry.links.first())
        .map(|l| l.href.trim().to_string())
        .unwrap_or_default();
    let published = entry
        .published
        .or(entry.updated)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default();
    let snippet = entry
        .summary
        .map(|t| t.content)
        .or(entry.content.and_then(|c| c.body))
        .map(|s| truncate_chars(&strip_html(&s), max_snippet_length))
        .unwrap_or_default();

    RawEntry::new(title.trim(), link)
        .with_published(published)
        .with_snippet(snippet)
}

/// Longest entity name decoded by [`strip_html`].
const MAX_ENTITY_LENGTH: usize = 10;

/// Strip HTML tags and decode entities in a snippet, collapsing whitespace.
fn strip_html(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut entity: Option<String> = None;

    for ch in html.chars() {
        if let Some(mut name) = entity.take() {
            if ch == ';' {
                decode_entity(&name, &mut result);
                continue;
            }
            if (ch.is_ascii_alphanumeric() || ch == '#') && name.len() < MAX_ENTITY_LENGTH {
                name.push(ch);
                entity = Some(name);
                continue;
            }
            // Not an entity after all
            result.push('&');
            result.push_str(&name);
        }

        match ch {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                result.push(' ');
            }
            '&' if !in_tag => entity = Some(String::new()),
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }
    if let Some(name) = entity {
        result.push('&');
        result.push_str(&name);
    }

    result.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entity(name: &str, out: &mut String) {
    match name {
        "amp" => out.push('&'),
        "lt" => out.push('<'),
        "gt" => out.push('>'),
        "quot" => out.push('"'),
        "apos" => out.push('\''),
        "nbsp" => out.push(' '),
        _ => match parse_numeric_entity(name).and_then(char::from_u32) {
            Some(c) => out.push(c),
            None => {
                // Unknown entity, keep as-is
                out.push('&');
                out.push_str(name);
                out.push(';');
            }
        },
    }
}

/// Parse a numeric entity name such as `#8217` or `#x27`.
pub(super) fn parse_numeric_entity(name: &str) -> Option<u32> {
    if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        name.strip_prefix('#')?.parse().ok()
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}
