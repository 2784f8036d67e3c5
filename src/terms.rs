//! Global term dictionary construction.
//!
//! Per-batch `.terms` files arrive as unsorted runs of batch-unique terms.
//! The collector appends each run to one in-memory vector, sorts it in
//! parallel, and tracks it as a span on a stack. Whenever the top two
//! spans sit at the same level they are merged and deduplicated, which
//! keeps every merge balanced: total work stays O(M log N) over M terms
//! from N batches, and memory stays one term vector plus a scratch buffer
//! for the spans being merged.

use crate::types::TermId;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::io::BufRead;

#[derive(Debug, Clone, Copy)]
struct TermSpan {
    first: usize,
    last: usize,
    level: u32,
}

/// Accumulates per-batch term runs into one sorted, duplicate-free list.
#[derive(Default)]
pub struct TermCollector {
    terms: Vec<String>,
    spans: Vec<TermSpan>,
}

impl TermCollector {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one batch's `.terms` lines as a new level-0 span, sorting
    /// the span in parallel and folding equal-level spans together.
    pub fn push_batch(&mut self, reader: impl BufRead) -> std::io::Result<()> {
        let mid = self.terms.len();
        for line in reader.lines() {
            self.terms.push(line?);
        }
        self.terms[mid..].par_sort_unstable();
        self.push_span(TermSpan {
            first: mid,
            last: self.terms.len(),
            level: 0,
        });
        Ok(())
    }

    fn push_span(&mut self, mut span: TermSpan) {
        while self
            .spans
            .last()
            .is_some_and(|top| top.level == span.level)
        {
            let lhs = self.spans.pop().expect("span stack checked non-empty");
            span = self.merge_spans(lhs, span);
        }
        self.spans.push(span);
    }

    /// Merge two adjacent sorted spans in place, dropping duplicates.
    ///
    /// By construction the spans being merged are always the rightmost
    /// region of the term vector, so the merged output replaces the tail.
    fn merge_spans(&mut self, lhs: TermSpan, rhs: TermSpan) -> TermSpan {
        assert_eq!(
            lhs.last, rhs.first,
            "merged term spans must be adjacent: [{}, {}) vs [{}, {})",
            lhs.first, lhs.last, rhs.first, rhs.last
        );
        debug_assert_eq!(rhs.last, self.terms.len());

        let mut left = self.terms.split_off(lhs.first);
        let right = left.split_off(lhs.last - lhs.first);
        let mut merged = Vec::with_capacity(left.len() + right.len());

        let mut left = left.into_iter();
        let mut right = right.into_iter();
        let (mut a, mut b) = (left.next(), right.next());
        loop {
            match (a.take(), b.take()) {
                (Some(x), Some(y)) => match x.cmp(&y) {
                    Ordering::Less => {
                        merged.push(x);
                        a = left.next();
                        b = Some(y);
                    }
                    Ordering::Greater => {
                        merged.push(y);
                        a = Some(x);
                        b = right.next();
                    }
                    Ordering::Equal => {
                        merged.push(x);
                        a = left.next();
                        b = right.next();
                    }
                },
                (Some(x), None) => {
                    merged.push(x);
                    merged.extend(left.by_ref());
                    break;
                }
                (None, Some(y)) => {
                    merged.push(y);
                    merged.extend(right.by_ref());
                    break;
                }
                (None, None) => break,
            }
        }

        self.terms.append(&mut merged);
        TermSpan {
            first: lhs.first,
            last: self.terms.len(),
            level: lhs.level + 1,
        }
    }

    /// Collapse the remaining spans and return the global term list,
    /// sorted lexicographically with no duplicates.
    pub fn finish(mut self) -> Vec<String> {
        while self.spans.len() > 1 {
            let rhs = self.spans.pop().expect("span stack has two entries");
            let lhs = self.spans.pop().expect("span stack has two entries");
            let merged = self.merge_spans(lhs, rhs);
            self.spans.push(merged);
        }
        self.terms.shrink_to_fit();
        self.terms
    }
}

/// Invert a term list into a term -> id map. Ids are list positions.
pub fn reverse_mapping(terms: Vec<String>) -> HashMap<String, TermId> {
    terms
        .into_iter()
        .enumerate()
        .map(|(id, term)| (term, id as TermId))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn collect(batches: &[&[&str]]) -> Vec<String> {
        let mut collector = TermCollector::new();
        for batch in batches {
            let lines = batch.join("\n");
            collector.push_batch(Cursor::new(lines.into_bytes())).unwrap();
        }
        collector.finish()
    }

    #[test]
    fn test_single_batch_sorted() {
        let terms = collect(&[&["quick", "brown", "fox"]]);
        assert_eq!(terms, vec!["brown", "fox", "quick"]);
    }

    #[test]
    fn test_overlap_deduplicated() {
        let terms = collect(&[&["a", "b"], &["b", "c"], &["c", "a"]]);
        assert_eq!(terms, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_batches() {
        assert!(collect(&[]).is_empty());
        assert!(collect(&[&[], &[], &[]]).is_empty());
        let terms = collect(&[&[], &["z", "a"], &[]]);
        assert_eq!(terms, vec!["a", "z"]);
    }

    #[test]
    fn test_many_batches_stay_sorted_unique() {
        // Enough batches to drive spans through several merge levels.
        let batches: Vec<Vec<String>> = (0..13)
            .map(|i| (0..7).map(|j| format!("term{:03}", (i * 5 + j * 3) % 29)).collect())
            .collect();
        let mut collector = TermCollector::new();
        for batch in &batches {
            // Batch runs are unique within themselves, as produced by the
            // batch processor's dictionary.
            let mut unique = batch.clone();
            unique.sort();
            unique.dedup();
            let lines = unique.join("\n");
            collector.push_batch(Cursor::new(lines.into_bytes())).unwrap();
        }
        let terms = collector.finish();
        assert!(terms.windows(2).all(|w| w[0] < w[1]), "strictly increasing");

        let mut expected: Vec<String> = batches.into_iter().flatten().collect();
        expected.sort();
        expected.dedup();
        assert_eq!(terms, expected);
    }

    #[test]
    fn test_reverse_mapping() {
        let mapping = reverse_mapping(vec!["brown".into(), "fox".into(), "quick".into()]);
        assert_eq!(mapping["brown"], 0);
        assert_eq!(mapping["fox"], 1);
        assert_eq!(mapping["quick"], 2);
        assert_eq!(mapping.len(), 3);
    }
}
