//! Core types for the forward-index pipeline.

/// Document identifier type. Assigned in source order, 0-based.
pub type DocId = u32;

/// Term identifier type. Local ids are batch-relative; global ids index
/// into the final term dictionary.
pub type TermId = u32;

/// A document pulled from the record source.
///
/// Created by the record reader, moved through the pipeline, and consumed
/// exactly once by a batch processor. Records with `valid == false` are
/// skipped before being counted.
#[derive(Debug, Clone, Default)]
pub struct DocumentRecord {
    /// Opaque external identifier, preserved verbatim in the `.documents`
    /// sidecar.
    pub trecid: String,
    /// Source URL, possibly empty.
    pub url: String,
    /// Document body. Record readers sanitize raw input to UTF-8 at the
    /// boundary.
    pub content: String,
    /// Whether the record parsed cleanly.
    pub valid: bool,
}

impl DocumentRecord {
    /// Create a valid record with no URL.
    pub fn new(trecid: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            trecid: trecid.into(),
            url: String::new(),
            content: content.into(),
            valid: true,
        }
    }
}
