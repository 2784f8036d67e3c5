//! Record readers: pull `DocumentRecord`s from an input byte stream.
//!
//! A reader is a stateful callable over the stream; it returns `Ok(None)`
//! at end of stream. Parse trouble local to one record surfaces as a
//! record with `valid == false`, which the driver skips without counting.
//! Stream-level I/O errors are fatal.

use crate::types::DocumentRecord;
use std::io::{self, BufRead};

/// Read one plain-text record: the first whitespace-delimited token on a
/// line is the document identifier, the remainder of the line is the
/// content. Blank lines are skipped. URLs are not part of this format.
pub fn read_plaintext_record(input: &mut dyn BufRead) -> io::Result<Option<DocumentRecord>> {
    let mut line = Vec::new();
    loop {
        line.clear();
        if input.read_until(b'\n', &mut line)? == 0 {
            return Ok(None);
        }
        let text = String::from_utf8_lossy(&line);
        let text = text.trim_end_matches(['\r', '\n']).trim_start();
        if text.is_empty() {
            continue;
        }
        let (trecid, content) = match text.split_once(|c: char| c.is_ascii_whitespace()) {
            Some((id, rest)) => (id, rest),
            None => (text, ""),
        };
        return Ok(Some(DocumentRecord::new(trecid, content)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn drain(input: &str) -> Vec<DocumentRecord> {
        let mut cursor = Cursor::new(input.as_bytes().to_vec());
        let mut records = Vec::new();
        while let Some(record) = read_plaintext_record(&mut cursor).unwrap() {
            records.push(record);
        }
        records
    }

    #[test]
    fn test_id_then_content() {
        let records = drain("d0 the quick brown fox\nd1\tthe lazy dog\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].trecid, "d0");
        assert_eq!(records[0].content, "the quick brown fox");
        assert_eq!(records[1].trecid, "d1");
        assert_eq!(records[1].content, "the lazy dog");
        assert!(records.iter().all(|r| r.valid && r.url.is_empty()));
    }

    #[test]
    fn test_id_only_line() {
        let records = drain("d0\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].trecid, "d0");
        assert_eq!(records[0].content, "");
    }

    #[test]
    fn test_blank_lines_skipped() {
        let records = drain("\n\nd0 text\n   \nd1 more\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].trecid, "d0");
        assert_eq!(records[1].trecid, "d1");
    }

    #[test]
    fn test_missing_trailing_newline() {
        let records = drain("d0 text");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content, "text");
    }

    #[test]
    fn test_empty_stream() {
        assert!(drain("").is_empty());
    }
}
