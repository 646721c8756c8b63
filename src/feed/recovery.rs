//! Entry recovery for malformed feed documents.
//!
//! Runs only after a full parse has failed. The document is first repaired
//! (bare `&` escaped) and reparsed. If it is still rejected, every complete
//! `<item>` or `<entry>` block is parsed on its own inside the document's
//! leading markup, and whatever parses is kept.

use feed_rs::model::Entry;
use feed_rs::parser;
use tracing::debug;

use super::fetcher::parse_numeric_entity;

const BLOCK_TAGS: [&str; 2] = ["item", "entry"];

/// Recover the entries a malformed document still carries, in document order.
pub(super) fn recover_entries(text: &str) -> Vec<Entry> {
    let repaired = escape_bare_ampersands(text);
    if let Ok(feed) = parser::parse(repaired.as_bytes()) {
        debug!(count = feed.entries.len(), "Feed parsed after escaping bare ampersands");
        return feed.entries;
    }
    salvage_blocks(&repaired)
}

/// Replace every `&` that does not start an XML entity reference with `&amp;`.
fn escape_bare_ampersands(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + 1..];
        if starts_with_entity_reference(tail) {
            out.push('&');
        } else {
            out.push_str("&amp;");
        }
        rest = tail;
    }
    out.push_str(rest);
    out
}

fn starts_with_entity_reference(tail: &str) -> bool {
    let Some(end) = tail.find(';') else {
        return false;
    };
    match &tail[..end] {
        "amp" | "lt" | "gt" | "quot" | "apos" => true,
        name => parse_numeric_entity(name).is_some(),
    }
}

fn salvage_blocks(text: &str) -> Vec<Entry> {
    let Some((tag, first)) = BLOCK_TAGS
        .iter()
        .filter_map(|tag| find_open_tag(text, tag).map(|pos| (*tag, pos)))
        .min_by_key(|(_, pos)| *pos)
    else {
        return Vec::new();
    };

    let header = &text[..first];
    let closers: String = open_elements(header)
        .iter()
        .rev()
        .map(|name| format!("</{name}>"))
        .collect();
    let close = format!("</{tag}>");

    let mut entries = Vec::new();
    let mut rest = &text[first..];
    while let Some(start) = find_open_tag(rest, tag) {
        let block_and_tail = &rest[start..];
        let Some(end) = block_and_tail.find(&close) else {
            // Truncated final block.
            break;
        };
        let block_end = end + close.len();
        let document = format!("{header}{}{closers}", &block_and_tail[..block_end]);
        match parser::parse(document.as_bytes()) {
            Ok(feed) => entries.extend(feed.entries),
            Err(e) => debug!(tag, "Skipping unrecoverable feed block: {}", e),
        }
        rest = &block_and_tail[block_end..];
    }

    debug!(count = entries.len(), tag, "Salvaged feed blocks");
    entries
}

/// Position of the first `<tag` that opens exactly that element.
fn find_open_tag(text: &str, tag: &str) -> Option<usize> {
    let pattern = format!("<{tag}");
    let mut offset = 0;
    while let Some(pos) = text[offset..].find(&pattern) {
        let at = offset + pos;
        match text[at + pattern.len()..].chars().next() {
            Some(c) if c == '>' || c.is_whitespace() => return Some(at),
            _ => offset = at + pattern.len(),
        }
    }
    None
}

/// Names of the elements left open at the end of `markup`, outermost first.
fn open_elements(markup: &str) -> Vec<&str> {
    let mut stack: Vec<&str> = Vec::new();
    let mut rest = markup;
    while let Some(start) = rest.find('<') {
        rest = &rest[start + 1..];

        let terminator = if rest.starts_with("![CDATA[") {
            "]]>"
        } else if rest.starts_with("!--") {
            "-->"
        } else {
            ">"
        };
        let Some(end) = rest.find(terminator) else {
            break;
        };
        let tag = &rest[..end];
        rest = &rest[end + terminator.len()..];

        if tag.starts_with('?') || tag.starts_with('!') || tag.ends_with('/') {
            continue;
        }
        if let Some(name) = tag.strip_prefix('/') {
            let name = name.trim();
            if let Some(pos) = stack.iter().rposition(|open| *open == name) {
                stack.truncate(pos);
            }
        } else if let Some(name) = tag.split_whitespace().next() {
            stack.push(name);
        }
    }
    stack
}
