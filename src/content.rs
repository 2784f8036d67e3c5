//! Content splitters: turn a record body into a stream of raw terms.
//!
//! A splitter consumes the body and calls `emit` once per raw term, in
//! document order. Term normalization is a separate caller-supplied step.

use scraper::Html;
use std::str::FromStr;

/// Function type shared by the built-in splitters.
pub type Splitter = fn(String, &mut dyn FnMut(String));

/// Content format recognized by the built-in splitters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentFormat {
    /// Whitespace-separated plain text.
    Plaintext,
    /// HTML with a leading preamble block (e.g. captured HTTP headers).
    Html,
}

impl ContentFormat {
    /// The splitter implementing this format.
    pub fn splitter(self) -> Splitter {
        match self {
            ContentFormat::Plaintext => split_plaintext,
            ContentFormat::Html => split_html,
        }
    }
}

impl FromStr for ContentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plaintext" => Ok(ContentFormat::Plaintext),
            "html" => Ok(ContentFormat::Html),
            other => Err(format!("unknown content format: {other}")),
        }
    }
}

/// Split plain text on ASCII whitespace.
pub fn split_plaintext(content: String, emit: &mut dyn FnMut(String)) {
    for token in content.split_ascii_whitespace() {
        emit(token.to_string());
    }
}

/// Split HTML content.
///
/// Strips tags and entities, drops everything up to and including the
/// first blank line (a newline followed, possibly across other whitespace,
/// by another newline), then emits maximal runs of ASCII alphanumeric
/// characters. Content with no blank line yields no terms.
pub fn split_html(content: String, emit: &mut dyn FnMut(String)) {
    let text = strip_html(&content);
    let Some(body) = after_first_blank_line(&text) else {
        return;
    };

    let mut term = String::new();
    for ch in body.chars() {
        if ch.is_ascii_alphanumeric() {
            term.push(ch);
        } else if !term.is_empty() {
            emit(std::mem::take(&mut term));
        }
    }
    if !term.is_empty() {
        emit(term);
    }
}

/// Extract the text content of an HTML document, decoding entities and
/// discarding markup. Whitespace inside text nodes is preserved.
fn strip_html(content: &str) -> String {
    Html::parse_document(content).root_element().text().collect()
}

/// Return the text following the first blank line, or `None` if there is
/// no blank line. A blank line is a `\n` separated from the next `\n` by
/// nothing but non-newline ASCII whitespace.
fn after_first_blank_line(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut pos = 0;
    while pos < bytes.len() {
        let newline = bytes[pos..].iter().position(|&b| b == b'\n')?;
        let mut next = pos + newline + 1;
        while next < bytes.len() && bytes[next] != b'\n' && bytes[next].is_ascii_whitespace() {
            next += 1;
        }
        if next < bytes.len() && bytes[next] == b'\n' {
            return Some(&text[next + 1..]);
        }
        pos = next;
    }
    None
}
